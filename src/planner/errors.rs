//! Planner error types
//!
//! Error codes:
//! - SHARD_CONFIGURATION_ERROR (FATAL)
//! - SHARD_QUERY_INVALID (REJECT)

use std::fmt;

/// Severity levels for planner errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Client request rejected
    Reject,
    /// Kernel misconfigured, planning must abort
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Planner-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerErrorCode {
    /// A precondition on kernel configuration does not hold
    ShardConfigurationError,
    /// Malformed query expression
    ShardQueryInvalid,
}

impl PlannerErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            PlannerErrorCode::ShardConfigurationError => "SHARD_CONFIGURATION_ERROR",
            PlannerErrorCode::ShardQueryInvalid => "SHARD_QUERY_INVALID",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            PlannerErrorCode::ShardConfigurationError => Severity::Fatal,
            PlannerErrorCode::ShardQueryInvalid => Severity::Reject,
        }
    }
}

impl fmt::Display for PlannerErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Planner error type with full context
#[derive(Debug, Clone)]
pub struct PlannerError {
    code: PlannerErrorCode,
    message: String,
}

impl PlannerError {
    /// Create a configuration error
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self {
            code: PlannerErrorCode::ShardConfigurationError,
            message: reason.into(),
        }
    }

    /// Create a query invalid error
    pub fn query_invalid(reason: impl Into<String>) -> Self {
        Self {
            code: PlannerErrorCode::ShardQueryInvalid,
            message: reason.into(),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> PlannerErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// True if planning cannot continue under the current configuration
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for PlannerError {}

impl From<serde_json::Error> for PlannerError {
    fn from(err: serde_json::Error) -> Self {
        PlannerError::query_invalid(err.to_string())
    }
}

/// Result type for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            PlannerErrorCode::ShardConfigurationError.code(),
            "SHARD_CONFIGURATION_ERROR"
        );
        assert_eq!(
            PlannerErrorCode::ShardQueryInvalid.code(),
            "SHARD_QUERY_INVALID"
        );
    }

    #[test]
    fn test_error_display() {
        let err = PlannerError::configuration("type registry is missing");
        assert!(err.is_fatal());
        assert_eq!(
            err.to_string(),
            "[FATAL] SHARD_CONFIGURATION_ERROR: type registry is missing"
        );
        assert!(!PlannerError::query_invalid("x").is_fatal());
    }
}
