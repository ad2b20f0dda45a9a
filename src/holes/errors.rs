//! # Index Hole Errors

use thiserror::Error;

/// Result type for index hole operations
pub type HoleResult<T> = Result<T, HoleError>;

/// Errors raised while building or loading index holes
#[derive(Debug, Error)]
pub enum HoleError {
    /// Date bound is not `yyyyMMdd`
    #[error("Invalid hole date '{0}', expected yyyyMMdd")]
    InvalidDate(String),

    /// Start bound sorts after end bound
    #[error("Inverted {kind} range [{start},{end}]")]
    InvertedRange {
        kind: &'static str,
        start: String,
        end: String,
    },

    /// Metadata source failed
    #[error("Index hole source failed: {0}")]
    Source(String),

    /// Hole listing could not be decoded
    #[error("Invalid index hole JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error reading index holes: {0}")]
    Io(#[from] std::io::Error),
}
