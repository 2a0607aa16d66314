//! Interactive terminal session.
//!
//! One command runs to completion before the next line is read; there is no
//! in-flight cancellation.

use anyhow::Result;
use rustyline::error::ReadlineError;
use tracing::debug;

use crate::commands::CommandDispatcher;
use crate::config::loader::get_data_dir;
use crate::query::session::SessionState;

/// Run the interactive loop until EOF, Ctrl-C, or `exit`.
pub async fn run(dispatcher: &CommandDispatcher) -> Result<()> {
    let history_path = get_data_dir().join("history.txt");
    let mut rl = rustyline::DefaultEditor::new()?;
    let _ = rl.load_history(&history_path);

    let mut session = SessionState::new();
    println!("Type 'help' for available commands.");

    loop {
        let prompt = format!("{} $ ", session.current_dir);
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                if line == "exit" {
                    break;
                }
                let _ = rl.add_history_entry(&line);

                let result = dispatcher.execute(&line, &mut session).await;
                if result.clear {
                    // ANSI clear screen and home.
                    print!("\x1b[2J\x1b[H");
                }
                if let Some(output) = result.output {
                    if !output.is_empty() {
                        println!("{output}");
                    }
                }
                debug!(dir = %session.current_dir, "command complete");
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    let _ = rl.save_history(&history_path);
    println!("Goodbye!");
    Ok(())
}
