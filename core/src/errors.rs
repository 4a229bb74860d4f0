use thiserror::Error;

/// Errors that can abort a compile run.
///
/// A malformed input line and a violated invariant both stop the fold, but
/// each carries the 1-based input line number so a caller can point back at
/// the offending record.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("line {line}: {message}")]
    Invariant { line: usize, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CompileError>;
