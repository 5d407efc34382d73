//! Unified error type for search and tool operations.

use thiserror::Error;

/// All errors that can occur in sandboxed search and file operations.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Path escapes the sandbox root. Always checked before existence.
    #[error("Cannot access \"{path}\" as it is outside the permitted working directory")]
    OutsideSandbox { path: String },

    /// Root or target path does not exist
    #[error("Path does not exist: \"{0}\"")]
    NotFound(String),

    #[error("\"{0}\" is not a directory")]
    NotADirectory(String),

    #[error("File not found or is not a regular file: \"{0}\"")]
    NotAFile(String),

    /// File exceeds the byte ceiling for reading
    #[error("File \"{path}\" is too large ({size} bytes, limit {limit})")]
    TooLarge { path: String, size: u64, limit: u64 },

    /// Invalid regex pattern
    #[error("Invalid regex pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Invalid name glob
    #[error("Invalid glob pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// Dispatcher received a name it does not know
    #[error("Unknown function: {0}")]
    UnknownOperation(String),

    /// Missing or wrongly-shaped argument after aliasing
    #[error("{0}")]
    InvalidArgs(String),

    #[error("\"{path}\" timed out after {secs}s")]
    Timeout { path: String, secs: u64 },

    /// I/O error (file read/write, directory access, process spawn)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Lock poisoned (thread panicked while holding a lock)
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl SearchError {
    /// Stable machine-readable kind used in structured error payloads.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            SearchError::OutsideSandbox { .. } => "outside_sandbox",
            SearchError::NotFound(_) => "not_found",
            SearchError::NotADirectory(_) => "not_a_directory",
            SearchError::NotAFile(_) => "not_a_file",
            SearchError::TooLarge { .. } => "too_large",
            SearchError::InvalidPattern { .. } | SearchError::InvalidGlob { .. } => "invalid_pattern",
            SearchError::UnknownOperation(_) => "unknown_operation",
            SearchError::InvalidArgs(_) => "argument_error",
            SearchError::Timeout { .. } => "timeout",
            SearchError::Io(_) => "io",
            SearchError::LockPoisoned(_) => "internal",
        }
    }
}
