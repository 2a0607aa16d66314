//! Domain error types for termbot.
//!
//! Typed errors at module boundaries replace string-encoded errors and
//! enable structured error handling via pattern matching.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors raised while assembling the handler registry at startup.
///
/// These are the only fatal errors in the system: a misconfigured registry
/// aborts startup instead of limping along with ambiguous dispatch.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Handler '{0}' is already registered")]
    DuplicateHandler(String),
}

// ---------------------------------------------------------------------------
// Filesystem errors
// ---------------------------------------------------------------------------

/// Errors from the sandboxed filesystem capability.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("No such file or directory: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Not a file: {0}")]
    NotAFile(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Provider errors
// ---------------------------------------------------------------------------

/// Errors from LLM and data-collaborator HTTP operations.
///
/// Embedded in `anyhow::Error` so the collaborator trait signatures
/// (`-> anyhow::Result<...>`) stay unchanged while callers can downcast:
/// `e.downcast_ref::<ProviderError>()`.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("Failed to parse response JSON: {0}")]
    JsonParseError(String),

    #[error("Rate limited (status {status}): retry after {retry_after_ms}ms")]
    RateLimited { status: u16, retry_after_ms: u64 },

    #[error("Authentication failed (status {status}): {message}")]
    AuthError { status: u16, message: String },

    #[error("Server error (status {status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Empty response from provider")]
    EmptyResponse,
}

// ---------------------------------------------------------------------------
// Code generation errors
// ---------------------------------------------------------------------------

/// Errors from the `code` command pipeline.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// The LLM reply did not match the FILENAME / CODE / EXECUTE shape.
    #[error("Malformed code reply from LLM: {0}")]
    MalformedReply(String),

    #[error("Maximum fix attempts ({0}) reached without a successful run")]
    RetriesExhausted(usize),
}

/// Errors from the sandboxed code executor.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Execution timed out after {0}s")]
    Timeout(u64),

    #[error("Execution failed: {0}")]
    Failed(String),
}

// ---------------------------------------------------------------------------
// Execution failure classification
// ---------------------------------------------------------------------------

/// Closed set of fix strategies for a failed generated-code run.
///
/// Produced by [`classify_exec_error`] from the runtime error text. The
/// codegen retry loop selects its fix prompt from this set instead of
/// branching on raw error substrings at the prompt site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixStrategy {
    /// Undefined name or failed import: ask for complete imports.
    MissingImport,
    /// Syntax error: ask for a syntactically valid rewrite.
    SyntaxFix,
    /// Missing module/package on the host: ask for a stdlib-only version.
    MissingDependency,
    /// File or path issues inside the generated program.
    PathFix,
    /// Anything else: generic "here is the error, fix it" prompt.
    General,
}

/// Classify a runtime error message into a [`FixStrategy`].
///
/// Matches on known interpreter error patterns. Always returns a strategy;
/// [`FixStrategy::General`] is the catch-all.
pub fn classify_exec_error(error_msg: &str) -> FixStrategy {
    let lower = error_msg.to_lowercase();

    if lower.contains("modulenotfounderror")
        || lower.contains("cannot find module")
        || lower.contains("no module named")
    {
        return FixStrategy::MissingDependency;
    }

    if lower.contains("nameerror")
        || lower.contains("importerror")
        || lower.contains("is not defined")
        || lower.contains("referenceerror")
    {
        return FixStrategy::MissingImport;
    }

    if lower.contains("syntaxerror")
        || lower.contains("unexpected token")
        || lower.contains("indentationerror")
    {
        return FixStrategy::SyntaxFix;
    }

    if lower.contains("filenotfounderror")
        || lower.contains("no such file")
        || lower.contains("enoent")
    {
        return FixStrategy::PathFix;
    }

    FixStrategy::General
}
