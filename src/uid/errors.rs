//! # UID Errors

use thiserror::Error;

/// Result type for identifier operations
pub type UidResult<T> = Result<T, UidError>;

/// Identifier generation and parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UidError {
    /// Generator misconfigured (missing or out-of-range machine id, missing cache).
    /// Fatal: no identifier is produced.
    #[error("UID configuration error: {0}")]
    Configuration(String),

    /// String form could not be parsed
    #[error("Not a valid UID '{input}': {reason}")]
    Format { input: String, reason: String },

    /// Counter source could not hand out a counter
    #[error("Snowflake counter unavailable: {0}")]
    CounterUnavailable(String),
}

impl UidError {
    pub(crate) fn format(input: &str, reason: impl Into<String>) -> Self {
        UidError::Format {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns true for configuration errors
    pub fn is_configuration(&self) -> bool {
        matches!(self, UidError::Configuration(_))
    }

    /// Returns true for format errors
    pub fn is_format(&self) -> bool {
        matches!(self, UidError::Format { .. })
    }
}
