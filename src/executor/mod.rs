//! Chunked query execution for shardscan
//!
//! The executor drives a query that an external partitioner has split into
//! chunks, opening one scan session per chunk and concatenating results.
//!
//! # Execution Flow (strict order)
//!
//! 1. Duplicate the query as the base query and force the expression syntax
//! 2. Resolve the result cap from configuration and the query override
//! 3. Run the base query once if the partitioner asks to observe it
//! 4. Plan and open the first chunk (or the base query if there are none)
//! 5. On each pull, drain the open session, then close it and move on
//!
//! # Invariants
//!
//! - At most one scan session is open at a time
//! - Results follow chunk order, and store order within a chunk
//! - A chunk-local failure after the first chunk marks the stream partial

mod chunked;
mod errors;
mod query;
mod session;
mod store;
mod traits;

pub use chunked::{CancelHandle, ChunkedQueryExecutor, ChunkedResults};
pub use errors::{ExecutorError, ExecutorErrorCode, ExecutorResult, Severity};
pub use query::{
    Authorizations, Entry, Key, KeyRange, QueryConfiguration, QuerySettings, FORCED_SYNTAX,
    MAX_RESULTS_OVERRIDE, QUERY_SYNTAX,
};
pub use session::ScanSession;
pub use store::MemoryStore;
pub use traits::{Chunker, QueryLogic, ScanCursor, ScanStore};
