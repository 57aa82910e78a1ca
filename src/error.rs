//! Error types for the reconstruction engine.
//!
//! Clean error handling using `thiserror` for ergonomic error definitions.

use thiserror::Error;

/// Result type alias for reconstruction operations.
pub type Result<T> = std::result::Result<T, ReconError>;

/// Main error type for reconstruction operations.
#[derive(Error, Debug)]
pub enum ReconError {
    /// I/O failure on the input file or the snapshot writer (fatal)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input file yielded no parseable events
    #[error("no events parsed from {0}")]
    EmptyInput(String),

    /// A row that could not be parsed (dropped before reaching the core)
    #[error("malformed row {line}: {reason}")]
    MalformedRow { line: usize, reason: String },

    /// Invalid action byte in the feed
    #[error("invalid action: {0:?}")]
    InvalidAction(char),

    /// Invalid side byte in the feed
    #[error("invalid side: {0:?}")]
    InvalidSide(char),

    /// Timestamp that is not RFC-3339 nanoseconds
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Book state inconsistency detected
    #[error("book inconsistency: {0}")]
    InconsistentState(String),
}

impl ReconError {
    /// Create a malformed-row error from any string-like reason.
    pub fn malformed(line: usize, reason: impl Into<String>) -> Self {
        ReconError::MalformedRow {
            line,
            reason: reason.into(),
        }
    }
}
