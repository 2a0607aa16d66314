//! Sandboxed code execution capability.
//!
//! Runs generated programs through the host interpreter mapped from their
//! language, with a hard timeout. Consumed by the `code` command pipeline;
//! never invoked for arbitrary user input.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::errors::ExecError;

/// Languages the executor knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageKind {
    Python,
    JavaScript,
    TypeScript,
    Shell,
    Bash,
}

impl LanguageKind {
    /// Host interpreter command for this language.
    pub fn interpreter(&self) -> &'static str {
        match self {
            LanguageKind::Python => "python3",
            LanguageKind::JavaScript => "node",
            LanguageKind::TypeScript => "ts-node",
            LanguageKind::Shell => "sh",
            LanguageKind::Bash => "bash",
        }
    }

}

impl std::fmt::Display for LanguageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LanguageKind::Python => "python",
            LanguageKind::JavaScript => "javascript",
            LanguageKind::TypeScript => "typescript",
            LanguageKind::Shell => "shell",
            LanguageKind::Bash => "bash",
        };
        f.write_str(name)
    }
}

impl FromStr for LanguageKind {
    type Err = ExecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "python" | "py" => Ok(LanguageKind::Python),
            "javascript" | "js" => Ok(LanguageKind::JavaScript),
            "typescript" | "ts" => Ok(LanguageKind::TypeScript),
            "shell" | "sh" => Ok(LanguageKind::Shell),
            "bash" => Ok(LanguageKind::Bash),
            other => Err(ExecError::UnsupportedLanguage(other.to_string())),
        }
    }
}

/// Code execution capability.
#[async_trait]
pub trait CodeExecutor: Send + Sync {
    /// Run `file_path` with the interpreter for `kind`.
    ///
    /// Returns combined output text; a non-zero exit or spawn failure is an
    /// [`ExecError::Failed`] carrying the stderr/diagnostic text.
    async fn execute(&self, file_path: &Path, kind: LanguageKind) -> Result<String, ExecError>;
}

/// Executor that spawns the host interpreter as a child process.
pub struct ProcessRunner {
    timeout_secs: u64,
}

impl ProcessRunner {
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }
}

#[async_trait]
impl CodeExecutor for ProcessRunner {
    async fn execute(&self, file_path: &Path, kind: LanguageKind) -> Result<String, ExecError> {
        let mut cmd = Command::new(kind.interpreter());
        cmd.arg(file_path);
        if let Some(parent) = file_path.parent() {
            cmd.current_dir(parent);
        }
        cmd.kill_on_drop(true);

        let output = tokio::time::timeout(Duration::from_secs(self.timeout_secs), cmd.output())
            .await
            .map_err(|_| ExecError::Timeout(self.timeout_secs))?
            .map_err(|e| ExecError::Failed(format!("{}: {}", kind.interpreter(), e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            let detail = if stderr.trim().is_empty() {
                format!("exit status {}", output.status)
            } else {
                stderr.trim().to_string()
            };
            return Err(ExecError::Failed(detail));
        }

        if stderr.trim().is_empty() {
            Ok(stdout)
        } else {
            Ok(format!("Warning: {}\nOutput: {}", stderr.trim(), stdout))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_language_parsing() {
        assert_eq!("python".parse::<LanguageKind>().unwrap(), LanguageKind::Python);
        assert_eq!("JS".parse::<LanguageKind>().unwrap(), LanguageKind::JavaScript);
        assert_eq!("bash".parse::<LanguageKind>().unwrap(), LanguageKind::Bash);
    }

    #[test]
    fn test_unsupported_language() {
        let err = "cobol".parse::<LanguageKind>().unwrap_err();
        assert!(matches!(err, ExecError::UnsupportedLanguage(_)));
    }

    #[test]
    fn test_display_names() {
        assert_eq!(LanguageKind::Python.to_string(), "python");
        assert_eq!(LanguageKind::JavaScript.to_string(), "javascript");
    }

    #[tokio::test]
    async fn test_run_shell_script() {
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("hello.sh");
        std::fs::write(&script, "echo hi\n").unwrap();

        let runner = ProcessRunner::new(10);
        let out = runner.execute(&script, LanguageKind::Shell).await.unwrap();
        assert_eq!(out.trim(), "hi");
    }

    #[tokio::test]
    async fn test_run_failing_script() {
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("boom.sh");
        std::fs::write(&script, "echo oops >&2; exit 3\n").unwrap();

        let runner = ProcessRunner::new(10);
        let err = runner.execute(&script, LanguageKind::Shell).await.unwrap_err();
        match err {
            ExecError::Failed(msg) => assert!(msg.contains("oops")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
