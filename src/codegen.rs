//! LLM-backed code generation for the `code` command.
//!
//! The collaborator replies in a literal three-field format (`FILENAME:`,
//! fenced `CODE:` block, `EXECUTE:` line). The generated file is written
//! into the sandbox and executed; on failure the runtime error is
//! classified into a fix strategy and resubmitted, up to a fixed bound.

use std::sync::Arc;

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::errors::{classify_exec_error, CodegenError, FixStrategy};
use crate::providers::base::LlmProvider;
use crate::sandbox::exec::{CodeExecutor, LanguageKind};
use crate::sandbox::fs::{resolve_virtual, Filesystem};

/// Fix attempts before giving up on a failing program.
pub const MAX_FIX_ATTEMPTS: usize = 3;

static FILENAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"FILENAME: (.+)").unwrap());
// The language tag must stay on the fence line; a multi-line tag class
// would swallow the first token of the code body.
static CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```[a-zA-Z]*\n(.+?)```").unwrap());
static EXECUTE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"EXECUTE: (.+)").unwrap());

/// A parsed three-field code reply.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeReply {
    pub filename: String,
    pub code: String,
}

/// Extract the structured fields from an LLM reply.
pub fn parse_code_reply(reply: &str) -> Result<CodeReply, CodegenError> {
    let filename = FILENAME_RE
        .captures(reply)
        .map(|c| c[1].trim().to_string());
    let code = CODE_RE.captures(reply).map(|c| c[1].trim().to_string());
    let execute = EXECUTE_RE.captures(reply).is_some();

    match (filename, code, execute) {
        (Some(filename), Some(code), true) => Ok(CodeReply { filename, code }),
        _ => Err(CodegenError::MalformedReply(
            "missing FILENAME, CODE, or EXECUTE field".to_string(),
        )),
    }
}

fn system_prompt(language: LanguageKind) -> String {
    format!(
        "You are an expert {language} programmer who writes clean, efficient, and well-documented code.\n\
         You always include necessary imports and handle errors appropriately.\n\
         Current environment:\n\
         - Linux-based system\n\
         - Python 3 for Python code\n\
         - Node.js for JavaScript/TypeScript\n\
         - All standard libraries available"
    )
}

fn task_prompt(language: LanguageKind, description: &str) -> String {
    format!(
        "Create a {language} program that does the following: {description}\n\n\
         Your response MUST be in this exact format:\n\
         FILENAME: [filename with extension]\n\
         CODE:\n\
         ```{language}\n\
         [complete code with imports]\n\
         ```\n\
         EXECUTE: [command to run the code]"
    )
}

/// Instruction appended to a fix prompt, chosen by error classification.
fn fix_instruction(strategy: FixStrategy) -> &'static str {
    match strategy {
        FixStrategy::MissingImport => {
            "Ensure ALL imports are included at the top and every name is defined before use."
        }
        FixStrategy::SyntaxFix => {
            "Rewrite the code so it is syntactically valid; check indentation and brackets."
        }
        FixStrategy::MissingDependency => {
            "A required module is not installed. Rewrite the code using only the standard library."
        }
        FixStrategy::PathFix => {
            "The code references a file or path that does not exist. Create it first or use a relative path."
        }
        FixStrategy::General => "Fix the error and return the complete corrected code.",
    }
}

fn fix_prompt(language: LanguageKind, code: &str, error: &str, strategy: FixStrategy) -> String {
    format!(
        "The following code has an error:\n\n\
         CODE:\n{code}\n\n\
         ERROR:\n{error}\n\n\
         Please provide the corrected code in exactly this format:\n\
         FILENAME: [same filename]\n\
         CODE:\n\
         ```{language}\n\
         [corrected code]\n\
         ```\n\
         EXECUTE: [command to run the code]\n\n\
         {}",
        fix_instruction(strategy)
    )
}

/// Generates, writes, executes, and iteratively repairs code.
pub struct CodeGenerator {
    provider: Arc<dyn LlmProvider>,
    fs: Arc<dyn Filesystem>,
    executor: Arc<dyn CodeExecutor>,
}

impl CodeGenerator {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        fs: Arc<dyn Filesystem>,
        executor: Arc<dyn CodeExecutor>,
    ) -> Self {
        Self {
            provider,
            fs,
            executor,
        }
    }

    /// Run the full generate-execute-fix pipeline for one `code` command.
    pub async fn generate_and_run(
        &self,
        language: LanguageKind,
        description: &str,
        current_dir: &str,
    ) -> Result<String> {
        let system = system_prompt(language);
        let reply = self
            .provider
            .generate(&system, &task_prompt(language, description))
            .await?;
        let mut parsed = parse_code_reply(&reply)?;

        for attempt in 1..=MAX_FIX_ATTEMPTS {
            debug!(attempt, filename = %parsed.filename, "executing generated code");
            let virtual_path = resolve_virtual(current_dir, &parsed.filename);
            self.fs.write(&virtual_path, &parsed.code).await?;
            let host_path = self.fs.host_path(&virtual_path)?;

            match self.executor.execute(&host_path, language).await {
                Ok(output) => {
                    info!(filename = %parsed.filename, "generated code ran successfully");
                    return Ok(format!(
                        "File created: {}\n\nCode:\n{}\n\nExecution Output:\n{}",
                        parsed.filename, parsed.code, output
                    ));
                }
                Err(e) => {
                    let error_text = e.to_string();
                    let strategy = classify_exec_error(&error_text);
                    debug!(attempt, ?strategy, "generated code failed, requesting fix");

                    if attempt == MAX_FIX_ATTEMPTS {
                        break;
                    }

                    let fixed = self
                        .provider
                        .generate(
                            &system,
                            &fix_prompt(language, &parsed.code, &error_text, strategy),
                        )
                        .await?;
                    let fixed_parsed = parse_code_reply(&fixed)?;
                    // Keep the original filename so fixes overwrite in place.
                    parsed.code = fixed_parsed.code;
                }
            }
        }

        Err(CodegenError::RetriesExhausted(MAX_FIX_ATTEMPTS).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::base::testing::ScriptedProvider;
    use crate::sandbox::exec::ProcessRunner;
    use crate::sandbox::fs::SandboxFs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_well_formed_reply() {
        let reply = "FILENAME: hello.py\nCODE:\n```python\nprint('hi')\n```\nEXECUTE: python3 hello.py";
        let parsed = parse_code_reply(reply).unwrap();
        assert_eq!(parsed.filename, "hello.py");
        assert_eq!(parsed.code, "print('hi')");
    }

    #[test]
    fn test_parse_missing_execute_is_malformed() {
        let reply = "FILENAME: hello.py\nCODE:\n```python\nprint('hi')\n```";
        assert!(matches!(
            parse_code_reply(reply),
            Err(CodegenError::MalformedReply(_))
        ));
    }

    #[test]
    fn test_parse_multiline_code_block() {
        let reply = "FILENAME: f.py\n```python\nimport os\n\nprint(os.getcwd())\n```\nEXECUTE: python3 f.py";
        let parsed = parse_code_reply(reply).unwrap();
        assert!(parsed.code.starts_with("import os"));
        assert!(parsed.code.contains("print(os.getcwd())"));
    }

    #[test]
    fn test_parse_keeps_leading_code_token() {
        // The first word after the fence line belongs to the program.
        let reply = "FILENAME: hello.py\nCODE:\n```python\nprint('hi')\n```\nEXECUTE: python3 hello.py";
        assert_eq!(parse_code_reply(reply).unwrap().code, "print('hi')");
    }

    #[test]
    fn test_parse_fence_without_language_tag() {
        let reply = "FILENAME: r.sh\nCODE:\n```\necho ok\n```\nEXECUTE: sh r.sh";
        assert_eq!(parse_code_reply(reply).unwrap().code, "echo ok");
    }

    #[test]
    fn test_fix_prompt_carries_strategy_instruction() {
        let p = fix_prompt(
            LanguageKind::Python,
            "print(x)",
            "NameError: name 'x' is not defined",
            FixStrategy::MissingImport,
        );
        assert!(p.contains("every name is defined"));
        assert!(p.contains("NameError"));
    }

    #[tokio::test]
    async fn test_generate_and_run_shell_script() {
        let dir = TempDir::new().unwrap();
        let fs = Arc::new(SandboxFs::init(dir.path().join("tree")).await.unwrap());
        let provider = Arc::new(ScriptedProvider::new(vec![
            "FILENAME: hello.sh\nCODE:\n```sh\necho hello\n```\nEXECUTE: sh hello.sh",
        ]));
        let executor = Arc::new(ProcessRunner::new(10));

        let generator = CodeGenerator::new(provider, fs, executor);
        let out = generator
            .generate_and_run(LanguageKind::Shell, "say hello", "/home/user")
            .await
            .unwrap();
        assert!(out.contains("File created: hello.sh"));
        assert!(out.contains("Execution Output:\nhello"));
    }

    #[tokio::test]
    async fn test_fix_loop_recovers_after_failure() {
        let dir = TempDir::new().unwrap();
        let fs = Arc::new(SandboxFs::init(dir.path().join("tree")).await.unwrap());
        let provider = Arc::new(ScriptedProvider::new(vec![
            "FILENAME: run.sh\nCODE:\n```sh\nexit 1\n```\nEXECUTE: sh run.sh",
            "FILENAME: run.sh\nCODE:\n```sh\necho fixed\n```\nEXECUTE: sh run.sh",
        ]));
        let executor = Arc::new(ProcessRunner::new(10));

        let generator = CodeGenerator::new(provider, fs, executor);
        let out = generator
            .generate_and_run(LanguageKind::Shell, "exit cleanly", "/home/user")
            .await
            .unwrap();
        assert!(out.contains("Execution Output:\nfixed"));
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let dir = TempDir::new().unwrap();
        let fs = Arc::new(SandboxFs::init(dir.path().join("tree")).await.unwrap());
        let provider = Arc::new(ScriptedProvider::new(vec![
            "FILENAME: bad.sh\nCODE:\n```sh\nexit 1\n```\nEXECUTE: sh bad.sh",
        ]));
        let executor = Arc::new(ProcessRunner::new(10));

        let generator = CodeGenerator::new(provider, fs, executor);
        let err = generator
            .generate_and_run(LanguageKind::Shell, "always fail", "/home/user")
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CodegenError>(),
            Some(CodegenError::RetriesExhausted(_))
        ));
    }
}
