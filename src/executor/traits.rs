//! Seams to the collaborators the executor drives but does not implement

use super::errors::ExecutorResult;
use super::query::{Authorizations, Entry, KeyRange, QueryConfiguration, QuerySettings};
use super::session::ScanSession;

/// Plans one query into a scan
pub trait QueryLogic {
    /// Called once for the base query (when the chunker asks for it) and
    /// once per chunk. Chunk-specific failures should use
    /// [`ExecutorError::chunk_setup`](super::ExecutorError::chunk_setup).
    fn initialize(
        &mut self,
        settings: &QuerySettings,
        authorizations: &Authorizations,
    ) -> ExecutorResult<QueryConfiguration>;
}

/// Splits a base query into an ordered, finite, non-restartable sequence
/// of sub-queries
pub trait Chunker {
    /// Receives the base query before any chunk is requested
    fn set_base_query(&mut self, _base: &QuerySettings) {}

    /// True if the chunker must observe the full base query results before
    /// it can enumerate chunks
    fn pre_initialize_query_logic(&self) -> bool {
        false
    }

    /// Observes the base query results. Only called when
    /// [`pre_initialize_query_logic`](Chunker::pre_initialize_query_logic)
    /// returns true and the base query has work.
    fn initialize(
        &mut self,
        _base: &QueryConfiguration,
        _results: &mut ScanSession,
    ) -> ExecutorResult<()> {
        Ok(())
    }

    /// Next sub-query, `None` once exhausted
    fn next_chunk(&mut self) -> Option<QuerySettings>;
}

/// Open scan over a store. Dropping the cursor releases it.
pub type ScanCursor = Box<dyn Iterator<Item = ExecutorResult<Entry>> + Send>;

/// Store client able to open range scans
pub trait ScanStore: Send + Sync {
    /// Opens a batched scan over `ranges` of `table`, returning only entries
    /// visible to `authorizations`
    fn open_scan(
        &self,
        table: &str,
        authorizations: &Authorizations,
        ranges: &[KeyRange],
    ) -> ExecutorResult<ScanCursor>;
}
