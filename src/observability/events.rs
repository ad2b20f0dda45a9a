//! Observable events emitted by the query execution kernel
//!
//! Events are explicit and typed.

use std::fmt;

use super::logger::Severity;

/// Observable kernel events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Kernel configuration loaded
    ConfigLoaded,

    // Identifier generation
    /// UID generator created from configuration
    UidGeneratorCreated,
    /// Snowflake ids generated without a distributed counter cache
    SnowflakeCacheDisabled,

    // Index holes
    /// Index holes loaded from the metadata source
    HolesLoaded,

    // Literal normalization
    /// A string literal on an unindexed field was rewritten to a number
    LiteralRewritten,

    // Chunked execution
    /// Query initialization (including the first chunk) begins
    QueryInitialize,
    /// Max results override parameter could not be parsed
    MaxResultsOverrideInvalid,
    /// Partitioner requested the full base query before chunking
    ChunkerPreInitialize,
    /// A chunk was initialized and its scan opened
    ChunkStart,
    /// A chunk's results were exhausted
    ChunkComplete,
    /// A chunk failed setup and was skipped
    ChunkSkipped,
    /// No chunks were produced, the base query is executed instead
    ChunkFallbackBaseQuery,
    /// Execution stopped after an interruption
    ExecutionInterrupted,

    // Scan sessions
    /// Scan session opened
    SessionOpen,
    /// Scan session closed
    SessionClose,
}

impl Event {
    /// Returns the event name as logged
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::UidGeneratorCreated => "UID_GENERATOR_CREATED",
            Event::SnowflakeCacheDisabled => "SNOWFLAKE_CACHE_DISABLED",
            Event::HolesLoaded => "INDEX_HOLES_LOADED",
            Event::LiteralRewritten => "LITERAL_REWRITTEN",
            Event::QueryInitialize => "QUERY_INITIALIZE",
            Event::MaxResultsOverrideInvalid => "MAX_RESULTS_OVERRIDE_INVALID",
            Event::ChunkerPreInitialize => "CHUNKER_PRE_INITIALIZE",
            Event::ChunkStart => "CHUNK_START",
            Event::ChunkComplete => "CHUNK_COMPLETE",
            Event::ChunkSkipped => "CHUNK_SKIPPED",
            Event::ChunkFallbackBaseQuery => "CHUNK_FALLBACK_BASE_QUERY",
            Event::ExecutionInterrupted => "EXECUTION_INTERRUPTED",
            Event::SessionOpen => "SESSION_OPEN",
            Event::SessionClose => "SESSION_CLOSE",
        }
    }

    /// Default severity used when the event is logged
    pub fn severity(&self) -> Severity {
        match self {
            Event::SnowflakeCacheDisabled
            | Event::ChunkSkipped
            | Event::ExecutionInterrupted => Severity::Warn,
            Event::MaxResultsOverrideInvalid => Severity::Error,
            Event::LiteralRewritten
            | Event::ChunkFallbackBaseQuery
            | Event::SessionOpen
            | Event::SessionClose => Severity::Trace,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
