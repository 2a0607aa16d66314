//! Shell-like command dispatcher.
//!
//! One input line in, one [`CommandResult`] out. Tokenization is plain
//! whitespace splitting with no quoting. Collaborator failures are rendered
//! as one-line `<cmd>: <message>` output; the dispatcher itself never
//! returns an error to its caller.

use std::str::FromStr;
use std::sync::Arc;

use crate::codegen::CodeGenerator;
use crate::providers::base::LlmProvider;
use crate::query::router::QueryRouter;
use crate::query::session::SessionState;
use crate::sandbox::exec::LanguageKind;
use crate::sandbox::fs::{resolve_virtual, Filesystem};

const HELP_TEXT: &str = "Available commands:
  ls [path] - List directory contents
  cd [path] - Change directory
  pwd - Print working directory
  mkdir [path] - Create directory
  rm [-r] [path] - Remove file or directory
  touch [file] - Create empty file or update timestamp
  cat [file] - Display file contents
  echo [text] - Display text
  echo [text] > [file] - Write text to file
  clear - Clear terminal
  ask [question] - Ask the LLM a question
  code [language] [description] - Generate and execute code";

const CODE_USAGE: &str = "Usage: code [language] [description]
Examples:
  code python print hello world
  code javascript create a fibonacci function
  code typescript make a simple calculator";

/// Outcome of one dispatched command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandResult {
    /// Text to print; `None` for commands with no output (`clear`).
    pub output: Option<String>,
    /// Present when the working directory changed.
    pub new_directory: Option<String>,
    /// `clear` requests a screen wipe instead of printing.
    pub clear: bool,
}

impl CommandResult {
    fn text(s: impl Into<String>) -> Self {
        Self {
            output: Some(s.into()),
            ..Self::default()
        }
    }
}

pub struct CommandDispatcher {
    fs: Arc<dyn Filesystem>,
    router: QueryRouter,
    provider: Arc<dyn LlmProvider>,
    codegen: CodeGenerator,
}

impl CommandDispatcher {
    pub fn new(
        fs: Arc<dyn Filesystem>,
        router: QueryRouter,
        provider: Arc<dyn LlmProvider>,
        codegen: CodeGenerator,
    ) -> Self {
        Self {
            fs,
            router,
            provider,
            codegen,
        }
    }

    /// Dispatch one input line against the session's working directory.
    pub async fn execute(&self, line: &str, session: &mut SessionState) -> CommandResult {
        let args: Vec<&str> = line.split_whitespace().collect();
        let Some(&cmd) = args.first() else {
            return CommandResult::default();
        };

        match cmd {
            "ls" => self.cmd_ls(&args, session).await,
            "cd" => self.cmd_cd(&args, session).await,
            "pwd" => CommandResult::text(session.current_dir.clone()),
            "mkdir" => self.cmd_mkdir(&args, session).await,
            "rm" => self.cmd_rm(&args, session).await,
            "touch" => self.cmd_touch(&args, session).await,
            "cat" => self.cmd_cat(&args, session).await,
            "echo" => self.cmd_echo(&args, session).await,
            "help" => self.cmd_help(),
            "clear" => CommandResult {
                clear: true,
                ..CommandResult::default()
            },
            "code" => self.cmd_code(&args, session).await,
            "ask" => self.cmd_ask(&args, session).await,
            other => CommandResult::text(format!(
                "Command not found: {other}. Type 'help' for available commands."
            )),
        }
    }

    fn cmd_help(&self) -> CommandResult {
        let categories = self.router.registry().available_categories();
        if categories.is_empty() {
            return CommandResult::text(HELP_TEXT);
        }
        let mut out = String::from(HELP_TEXT);
        out.push_str("\n\nAsk categories:");
        for line in categories {
            out.push_str("\n  ");
            out.push_str(&line);
        }
        CommandResult::text(out)
    }

    async fn cmd_ls(&self, args: &[&str], session: &mut SessionState) -> CommandResult {
        let arg = args.get(1).copied().unwrap_or(".");
        let path = resolve_virtual(&session.current_dir, arg);
        match self.fs.list(&path).await {
            Ok(listing) => CommandResult::text(listing),
            Err(e) => CommandResult::text(format!("ls: cannot access '{arg}': {e}")),
        }
    }

    async fn cmd_cd(&self, args: &[&str], session: &mut SessionState) -> CommandResult {
        let target = args.get(1).copied().unwrap_or("/");
        match self
            .fs
            .change_directory(&session.current_dir, target)
            .await
        {
            Ok(dir) => {
                session.current_dir = dir.clone();
                CommandResult {
                    new_directory: Some(dir),
                    ..CommandResult::default()
                }
            }
            Err(e) => CommandResult::text(format!("cd: {e}")),
        }
    }

    async fn cmd_mkdir(&self, args: &[&str], session: &mut SessionState) -> CommandResult {
        let Some(&arg) = args.get(1) else {
            return CommandResult::text("mkdir: missing operand");
        };
        let path = resolve_virtual(&session.current_dir, arg);
        match self.fs.make_dir(&path).await {
            Ok(()) => CommandResult::text(format!("Created directory: {arg}")),
            Err(e) => CommandResult::text(format!("mkdir: cannot create directory '{arg}': {e}")),
        }
    }

    async fn cmd_rm(&self, args: &[&str], session: &mut SessionState) -> CommandResult {
        if args.len() < 2 {
            return CommandResult::text("rm: missing operand");
        }
        let recursive = args.contains(&"-r") || args.contains(&"-R");
        let arg = args[args.len() - 1];
        let path = resolve_virtual(&session.current_dir, arg);
        match self.fs.remove(&path, recursive).await {
            Ok(()) => CommandResult::text(format!("Removed: {arg}")),
            Err(e) => CommandResult::text(format!("rm: cannot remove '{arg}': {e}")),
        }
    }

    async fn cmd_touch(&self, args: &[&str], session: &mut SessionState) -> CommandResult {
        let Some(&arg) = args.get(1) else {
            return CommandResult::text("touch: missing file operand");
        };
        let path = resolve_virtual(&session.current_dir, arg);
        match self.fs.touch(&path).await {
            Ok(()) => CommandResult::text(""),
            Err(e) => CommandResult::text(format!("touch: cannot touch '{arg}': {e}")),
        }
    }

    async fn cmd_cat(&self, args: &[&str], session: &mut SessionState) -> CommandResult {
        let Some(&arg) = args.get(1) else {
            return CommandResult::text("cat: missing file operand");
        };
        let path = resolve_virtual(&session.current_dir, arg);
        match self.fs.read(&path).await {
            Ok(content) => CommandResult::text(content),
            Err(e) => CommandResult::text(format!("cat: {arg}: {e}")),
        }
    }

    async fn cmd_echo(&self, args: &[&str], session: &mut SessionState) -> CommandResult {
        if let Some(redirect) = args.iter().position(|a| *a == ">") {
            let Some(&file) = args.get(redirect + 1) else {
                return CommandResult::text("echo: syntax error: unexpected end of file");
            };
            let content = args[1..redirect].join(" ");
            let path = resolve_virtual(&session.current_dir, file);
            return match self.fs.write(&path, &content).await {
                Ok(()) => CommandResult::text(""),
                Err(e) => CommandResult::text(format!("echo: {e}")),
            };
        }
        CommandResult::text(args[1..].join(" "))
    }

    async fn cmd_code(&self, args: &[&str], session: &mut SessionState) -> CommandResult {
        let language_arg = args.get(1).copied().unwrap_or("python");
        let description = args.get(2..).unwrap_or(&[]).join(" ");
        if description.is_empty() {
            return CommandResult::text(CODE_USAGE);
        }

        let language = match LanguageKind::from_str(language_arg) {
            Ok(kind) => kind,
            Err(e) => return CommandResult::text(format!("code: {e}")),
        };

        match self
            .codegen
            .generate_and_run(language, &description, &session.current_dir)
            .await
        {
            Ok(output) => CommandResult::text(output),
            Err(e) => CommandResult::text(format!("Error: {e}")),
        }
    }

    async fn cmd_ask(&self, args: &[&str], session: &mut SessionState) -> CommandResult {
        let question = args[1..].join(" ");
        if question.is_empty() {
            return CommandResult::text("Error: Please provide a question");
        }

        if let Some(reply) = self.router.route(&question, session).await {
            return CommandResult::text(reply.response);
        }

        // No handler claimed the question; fall back to the general model.
        let user = format!(
            "Current directory: {}. Question: {}",
            session.current_dir, question
        );
        match self
            .provider
            .generate(
                "You are a helpful assistant inside a Linux-like terminal. Answer concisely.",
                &user,
            )
            .await
        {
            Ok(answer) => CommandResult::text(answer),
            Err(e) => CommandResult::text(format!("Error: {e}")),
        }
    }
}
