//! Executor error types
//!
//! Error codes:
//! - SHARD_CONFIGURATION_ERROR (FATAL)
//! - SHARD_CHUNK_SETUP_FAILED (ERROR, recovered by skipping the chunk)
//! - SHARD_STORE_FAILED (ERROR)
//! - SHARD_INTERRUPTED (ERROR)
//! - SHARD_INVALID_SESSION (REJECT)

use std::fmt;

use crate::planner::PlannerError;

/// Severity levels for executor errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Request rejected before any scan opened
    Reject,
    /// Operation failed but the kernel is healthy
    Error,
    /// Kernel misconfigured, nothing can run
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Executor-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorErrorCode {
    /// Configuration precondition failed
    ShardConfigurationError,
    /// One chunk could not be planned or opened
    ShardChunkSetupFailed,
    /// Store client failure not tied to a single chunk
    ShardStoreFailed,
    /// Blocking store call was interrupted
    ShardInterrupted,
    /// Scan session arguments are invalid
    ShardInvalidSession,
}

impl ExecutorErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            ExecutorErrorCode::ShardConfigurationError => "SHARD_CONFIGURATION_ERROR",
            ExecutorErrorCode::ShardChunkSetupFailed => "SHARD_CHUNK_SETUP_FAILED",
            ExecutorErrorCode::ShardStoreFailed => "SHARD_STORE_FAILED",
            ExecutorErrorCode::ShardInterrupted => "SHARD_INTERRUPTED",
            ExecutorErrorCode::ShardInvalidSession => "SHARD_INVALID_SESSION",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            ExecutorErrorCode::ShardConfigurationError => Severity::Fatal,
            ExecutorErrorCode::ShardInvalidSession => Severity::Reject,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for ExecutorErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Executor error type with full context
#[derive(Debug, Clone)]
pub struct ExecutorError {
    code: ExecutorErrorCode,
    message: String,
}

impl ExecutorError {
    fn new(code: ExecutorErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::new(ExecutorErrorCode::ShardConfigurationError, reason)
    }

    /// Create a chunk setup error
    pub fn chunk_setup(reason: impl Into<String>) -> Self {
        Self::new(ExecutorErrorCode::ShardChunkSetupFailed, reason)
    }

    /// Create a store failure
    pub fn store_failed(reason: impl Into<String>) -> Self {
        Self::new(ExecutorErrorCode::ShardStoreFailed, reason)
    }

    /// Create an interruption error
    pub fn interrupted(reason: impl Into<String>) -> Self {
        Self::new(ExecutorErrorCode::ShardInterrupted, reason)
    }

    /// Create an invalid session error
    pub fn invalid_session(reason: impl Into<String>) -> Self {
        Self::new(ExecutorErrorCode::ShardInvalidSession, reason)
    }

    /// Returns the error code
    pub fn code(&self) -> ExecutorErrorCode {
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

    pub fn is_interrupted(&self) -> bool {
        self.code == ExecutorErrorCode::ShardInterrupted
    }

    /// True if the failure is confined to one chunk and the query can go on
    pub fn is_chunk_local(&self) -> bool {
        self.code == ExecutorErrorCode::ShardChunkSetupFailed
    }
}

impl fmt::Display for ExecutorError {
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

impl std::error::Error for ExecutorError {}

impl From<PlannerError> for ExecutorError {
    fn from(err: PlannerError) -> Self {
        if err.is_fatal() {
            ExecutorError::configuration(err.message())
        } else {
            ExecutorError::chunk_setup(err.to_string())
        }
    }
}

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;
