//! Chunked Execution Tests
//!
//! Tests for chunked execution invariants:
//! - Results are the concatenation of chunk results in chunk order
//! - A chunk failing setup or mid-scan is skipped, not raised
//! - At most one scan session is open at any time
//! - Interruption and cancellation stop chunk pulling

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use shardscan::executor::{
    Authorizations, ChunkedQueryExecutor, Chunker, Entry, ExecutorError, ExecutorResult, Key,
    KeyRange, MemoryStore, QueryConfiguration, QueryLogic, QuerySettings, ScanCursor, ScanSession,
    ScanStore, MAX_RESULTS_OVERRIDE, QUERY_SYNTAX,
};
use shardscan::observability::MetricsRegistry;

// =============================================================================
// Test Doubles
// =============================================================================

/// Store wrapper counting opens and closes
struct CountingStore {
    inner: MemoryStore,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
    max_open: Arc<AtomicUsize>,
    fail_reads_on: Option<String>,
    chunk_fail_reads_on: Option<String>,
    interrupt_reads_on: Option<String>,
    fail_opens_on: Option<(String, ExecutorError)>,
}

struct CountingCursor {
    inner: ScanCursor,
    closed: Arc<AtomicUsize>,
    fail_with: Option<ExecutorError>,
}

impl Iterator for CountingCursor {
    type Item = ExecutorResult<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.fail_with.take() {
            return Some(Err(err));
        }
        self.inner.next()
    }
}

impl Drop for CountingCursor {
    fn drop(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

impl CountingStore {
    fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            opened: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
            max_open: Arc::new(AtomicUsize::new(0)),
            fail_reads_on: None,
            chunk_fail_reads_on: None,
            interrupt_reads_on: None,
            fail_opens_on: None,
        }
    }

    fn open_now(&self) -> usize {
        self.opened.load(Ordering::SeqCst) - self.closed.load(Ordering::SeqCst)
    }
}

impl ScanStore for CountingStore {
    fn open_scan(
        &self,
        table: &str,
        authorizations: &Authorizations,
        ranges: &[KeyRange],
    ) -> ExecutorResult<ScanCursor> {
        let start = ranges[0].start.clone().unwrap_or_default();
        if let Some((row, err)) = &self.fail_opens_on {
            if *row == start {
                return Err(err.clone());
            }
        }

        let inner = self.inner.open_scan(table, authorizations, ranges)?;
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.max_open.fetch_max(self.open_now(), Ordering::SeqCst);

        let fail_with = if self.fail_reads_on.as_deref() == Some(start.as_str()) {
            Some(ExecutorError::store_failed("tablet server went away"))
        } else if self.chunk_fail_reads_on.as_deref() == Some(start.as_str()) {
            Some(ExecutorError::chunk_setup(format!("chunk {} execution failed", start)))
        } else if self.interrupt_reads_on.as_deref() == Some(start.as_str()) {
            Some(ExecutorError::interrupted("scan interrupted"))
        } else {
            None
        };

        Ok(Box::new(CountingCursor {
            inner,
            closed: Arc::clone(&self.closed),
            fail_with,
        }))
    }
}

/// Plans an expression "PREFIX" as the row range [PREFIX, PREFIX~).
/// "FAIL" fails chunk setup; "" plans nothing.
struct PrefixLogic {
    planned: Arc<Mutex<Vec<QuerySettings>>>,
}

impl QueryLogic for PrefixLogic {
    fn initialize(
        &mut self,
        settings: &QuerySettings,
        authorizations: &Authorizations,
    ) -> ExecutorResult<QueryConfiguration> {
        self.planned.lock().unwrap().push(settings.clone());
        if settings.expression == "FAIL" {
            return Err(ExecutorError::chunk_setup("could not plan chunk"));
        }
        let ranges = if settings.expression.is_empty() {
            vec![]
        } else {
            vec![KeyRange::new(
                settings.expression.clone(),
                format!("{}~", settings.expression),
            )]
        };
        Ok(QueryConfiguration {
            query_id: settings.id,
            table: "shard".to_string(),
            authorizations: authorizations.clone(),
            ranges,
        })
    }
}

/// Yields fixed chunk expressions; optionally demands the base results first
struct ScriptedChunker {
    chunks: VecDeque<String>,
    pre_initialize: bool,
    observed: Arc<Mutex<Vec<String>>>,
    base_seen: Arc<AtomicBool>,
}

impl ScriptedChunker {
    fn new(chunks: &[&str]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            pre_initialize: false,
            observed: Arc::new(Mutex::new(Vec::new())),
            base_seen: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl Chunker for ScriptedChunker {
    fn set_base_query(&mut self, base: &QuerySettings) {
        assert_eq!(base.parameter(QUERY_SYNTAX), Some("JEXL"));
        self.base_seen.store(true, Ordering::SeqCst);
    }

    fn pre_initialize_query_logic(&self) -> bool {
        self.pre_initialize
    }

    fn initialize(
        &mut self,
        _base: &QueryConfiguration,
        results: &mut ScanSession,
    ) -> ExecutorResult<()> {
        let mut observed = self.observed.lock().unwrap();
        for entry in results {
            observed.push(entry?.value);
        }
        Ok(())
    }

    fn next_chunk(&mut self) -> Option<QuerySettings> {
        self.chunks
            .pop_front()
            .map(|expr| QuerySettings::new("chunk", expr))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn populated_store() -> MemoryStore {
    let store = MemoryStore::new();
    let rows = [
        ("a1", "a-one"),
        ("a2", "a-two"),
        ("b1", "b-one"),
        ("c1", "c-one"),
        ("c2", "c-two"),
        ("c3", "c-three"),
    ];
    for (row, value) in rows {
        store.insert("shard", Key::new(row, "field"), value).unwrap();
    }
    store
        .insert("shard", Key::new("c4", "field").with_visibility("SECRET"), "c-hidden")
        .unwrap();
    store
}

struct Harness {
    store: Arc<CountingStore>,
    planned: Arc<Mutex<Vec<QuerySettings>>>,
    metrics: Arc<MetricsRegistry>,
}

impl Harness {
    fn new() -> Self {
        Self::with_store(CountingStore::new(populated_store()))
    }

    fn with_store(store: CountingStore) -> Self {
        Self {
            store: Arc::new(store),
            planned: Arc::new(Mutex::new(Vec::new())),
            metrics: Arc::new(MetricsRegistry::new()),
        }
    }

    fn executor(&self, chunker: ScriptedChunker) -> ChunkedQueryExecutor {
        ChunkedQueryExecutor::new(
            Box::new(PrefixLogic {
                planned: Arc::clone(&self.planned),
            }),
            Box::new(chunker),
            self.store.clone(),
        )
        .with_metrics(Arc::clone(&self.metrics))
    }
}

fn query() -> QuerySettings {
    QuerySettings::new("people", "*")
}

// =============================================================================
// Chunk Ordering Tests
// =============================================================================

/// Results arrive chunk by chunk in partitioner order.
#[test]
fn test_results_concatenate_in_chunk_order() {
    let harness = Harness::new();
    let results = harness
        .executor(ScriptedChunker::new(&["c", "a", "b"]))
        .initialize(&query(), Authorizations::default())
        .unwrap();

    let values: Vec<String> = results.map(|e| e.unwrap().value).collect();
    assert_eq!(
        values,
        vec!["c-one", "c-two", "c-three", "a-one", "a-two", "b-one"]
    );
}

/// Chunk 2 fails setup: chunks 1 and 3 still stream, nothing escapes.
#[test]
fn test_failing_middle_chunk_is_skipped() {
    let harness = Harness::new();
    let mut results = harness
        .executor(ScriptedChunker::new(&["a", "FAIL", "c"]))
        .initialize(&query(), Authorizations::default())
        .unwrap();

    let values: Vec<String> = results.by_ref().map(|e| e.unwrap().value).collect();
    assert_eq!(values, vec!["a-one", "a-two", "c-one", "c-two", "c-three"]);
    assert_eq!(results.skipped_chunks(), 1);
    assert!(results.is_partial());
    assert!(!results.is_interrupted());

    let snapshot = harness.metrics.snapshot();
    assert_eq!(snapshot.chunks_skipped, 1);
    assert_eq!(snapshot.chunks_started, 2);
    assert_eq!(snapshot.entries_returned, 5);
}

/// When every later chunk fails the stream just ends, flagged partial.
#[test]
fn test_all_later_chunks_fail() {
    let harness = Harness::new();
    let mut results = harness
        .executor(ScriptedChunker::new(&["b", "FAIL", "FAIL"]))
        .initialize(&query(), Authorizations::default())
        .unwrap();

    assert_eq!(results.by_ref().count(), 1);
    assert_eq!(results.skipped_chunks(), 2);
    assert!(results.is_partial());
}

// =============================================================================
// Session Lifecycle Tests
// =============================================================================

/// Open minus close never exceeds one; everything is closed at the end.
#[test]
fn test_at_most_one_session_open() {
    let harness = Harness::new();
    let results = harness
        .executor(ScriptedChunker::new(&["a", "b", "", "c", "FAIL", "a"]))
        .initialize(&query(), Authorizations::default())
        .unwrap();

    for entry in results {
        entry.unwrap();
        assert!(harness.store.open_now() <= 1);
    }

    assert_eq!(harness.store.max_open.load(Ordering::SeqCst), 1);
    assert_eq!(harness.store.opened.load(Ordering::SeqCst), 4);
    assert_eq!(harness.store.open_now(), 0);
    assert_eq!(harness.metrics.sessions_open(), 0);
}

/// Dropping the stream early releases the open session.
#[test]
fn test_drop_mid_chunk_closes_session() {
    let harness = Harness::new();
    let mut results = harness
        .executor(ScriptedChunker::new(&["c", "a"]))
        .initialize(&query(), Authorizations::default())
        .unwrap();

    assert!(results.next().is_some());
    assert_eq!(harness.store.open_now(), 1);
    drop(results);
    assert_eq!(harness.store.open_now(), 0);
}

// =============================================================================
// Initialization Tests
// =============================================================================

/// Every planned query carries the forced syntax; the base query is renamed.
#[test]
fn test_forced_syntax_reaches_every_chunk() {
    let harness = Harness::new();
    let chunker = ScriptedChunker::new(&["a", "b"]);
    let base_seen = Arc::clone(&chunker.base_seen);
    let settings = query().with_parameter(QUERY_SYNTAX, "LUCENE");

    let results = harness
        .executor(chunker)
        .initialize(&settings, Authorizations::default())
        .unwrap();
    assert_eq!(results.base_query().name, "people-chunk");
    assert_eq!(results.count(), 3);

    assert!(base_seen.load(Ordering::SeqCst));
    let planned = harness.planned.lock().unwrap();
    assert_eq!(planned.len(), 2);
    assert!(planned
        .iter()
        .all(|s| s.parameter(QUERY_SYNTAX) == Some("JEXL")));
}

/// Partitioner sees the full base results before the first chunk.
#[test]
fn test_pre_initialize_runs_base_query() {
    let harness = Harness::new();
    let mut chunker = ScriptedChunker::new(&["b"]);
    chunker.pre_initialize = true;
    let observed = Arc::clone(&chunker.observed);

    let results = harness
        .executor(chunker)
        .initialize(&QuerySettings::new("people", "a"), Authorizations::default())
        .unwrap();

    assert_eq!(*observed.lock().unwrap(), vec!["a-one", "a-two"]);
    let values: Vec<String> = results.map(|e| e.unwrap().value).collect();
    assert_eq!(values, vec!["b-one"]);
    assert_eq!(harness.store.max_open.load(Ordering::SeqCst), 1);
}

/// Pre-initialization over an empty base query yields nothing.
#[test]
fn test_pre_initialize_with_empty_base() {
    let harness = Harness::new();
    let mut chunker = ScriptedChunker::new(&["a"]);
    chunker.pre_initialize = true;

    let mut results = harness
        .executor(chunker)
        .initialize(&QuerySettings::new("people", ""), Authorizations::default())
        .unwrap();
    assert!(results.planning().ranges.is_empty());
    assert!(results.next().is_none());
    assert_eq!(harness.store.opened.load(Ordering::SeqCst), 0);
}

/// The first chunk's setup failure is raised from initialize.
#[test]
fn test_first_chunk_failure_raised() {
    let harness = Harness::new();
    let err = harness
        .executor(ScriptedChunker::new(&["FAIL", "a"]))
        .initialize(&query(), Authorizations::default())
        .err()
        .unwrap();
    assert_eq!(err.code().code(), "SHARD_CHUNK_SETUP_FAILED");
}

/// Authorizations flow through planning into the scan.
#[test]
fn test_authorizations_filter_results() {
    let harness = Harness::new();
    let results = harness
        .executor(ScriptedChunker::new(&["c"]))
        .initialize(&query(), Authorizations::new(["SECRET"]))
        .unwrap();
    assert_eq!(results.count(), 4);
}

// =============================================================================
// Result Cap Tests
// =============================================================================

/// The override lowers the configured cap across chunk boundaries.
#[test]
fn test_max_results_override() {
    let harness = Harness::new();
    let settings = query().with_parameter(MAX_RESULTS_OVERRIDE, "3");
    let results = harness
        .executor(ScriptedChunker::new(&["a", "b", "c"]))
        .with_max_results(Some(100))
        .initialize(&settings, Authorizations::default())
        .unwrap();

    assert_eq!(results.count(), 3);
    assert_eq!(harness.store.open_now(), 0);
}

/// An unparseable override is ignored.
#[test]
fn test_invalid_override_ignored() {
    let harness = Harness::new();
    let settings = query().with_parameter(MAX_RESULTS_OVERRIDE, "lots");
    let results = harness
        .executor(ScriptedChunker::new(&["a", "b"]))
        .with_max_results(Some(2))
        .initialize(&settings, Authorizations::default())
        .unwrap();
    assert_eq!(results.count(), 2);
}

// =============================================================================
// Failure and Interruption Tests
// =============================================================================

/// A store read failure is yielded once, then the stream ends.
#[test]
fn test_store_failure_propagates() {
    let mut store = CountingStore::new(populated_store());
    store.fail_reads_on = Some("b".to_string());
    let harness = Harness::with_store(store);

    let mut results = harness
        .executor(ScriptedChunker::new(&["a", "b", "c"]))
        .initialize(&query(), Authorizations::default())
        .unwrap();

    assert_eq!(results.next().unwrap().unwrap().value, "a-one");
    assert_eq!(results.next().unwrap().unwrap().value, "a-two");
    let err = results.next().unwrap().unwrap_err();
    assert_eq!(err.code().code(), "SHARD_STORE_FAILED");
    assert!(results.next().is_none());
    assert!(!results.is_interrupted());
    assert_eq!(harness.store.open_now(), 0);
}

/// A chunk-local failure while reading a chunk skips only that chunk.
#[test]
fn test_chunk_failing_mid_scan_is_skipped() {
    let mut store = CountingStore::new(populated_store());
    store.chunk_fail_reads_on = Some("b".to_string());
    let harness = Harness::with_store(store);

    let mut results = harness
        .executor(ScriptedChunker::new(&["a", "b", "c"]))
        .initialize(&query(), Authorizations::default())
        .unwrap();

    let values: Vec<String> = results.by_ref().map(|e| e.unwrap().value).collect();
    assert_eq!(values, vec!["a-one", "a-two", "c-one", "c-two", "c-three"]);
    assert_eq!(results.skipped_chunks(), 1);
    assert!(results.is_partial());
    assert!(!results.is_interrupted());
    assert_eq!(harness.store.opened.load(Ordering::SeqCst), 3);
    assert_eq!(harness.store.open_now(), 0);
    assert_eq!(harness.metrics.snapshot().chunks_skipped, 1);
}

/// A later chunk whose session cannot be opened for chunk-local reasons is skipped.
#[test]
fn test_chunk_local_open_failure_is_skipped() {
    let mut store = CountingStore::new(populated_store());
    store.fail_opens_on = Some((
        "b".to_string(),
        ExecutorError::chunk_setup("tablet for chunk b offline"),
    ));
    let harness = Harness::with_store(store);

    let mut results = harness
        .executor(ScriptedChunker::new(&["a", "b", "c"]))
        .initialize(&query(), Authorizations::default())
        .unwrap();

    let values: Vec<String> = results.by_ref().map(|e| e.unwrap().value).collect();
    assert_eq!(values, vec!["a-one", "a-two", "c-one", "c-two", "c-three"]);
    assert_eq!(results.skipped_chunks(), 1);
    assert_eq!(harness.store.open_now(), 0);
}

/// A store failure opening a later chunk is yielded, then the stream ends.
#[test]
fn test_store_open_failure_propagates() {
    let mut store = CountingStore::new(populated_store());
    store.fail_opens_on = Some((
        "b".to_string(),
        ExecutorError::store_failed("store unreachable"),
    ));
    let harness = Harness::with_store(store);

    let mut results = harness
        .executor(ScriptedChunker::new(&["a", "b", "c"]))
        .initialize(&query(), Authorizations::default())
        .unwrap();

    let items: Vec<ExecutorResult<Entry>> = results.by_ref().collect();
    assert_eq!(items.len(), 3);
    assert_eq!(
        items[2].as_ref().unwrap_err().code().code(),
        "SHARD_STORE_FAILED"
    );
    assert_eq!(results.skipped_chunks(), 0);
    // Chunk "c" was never opened
    assert_eq!(harness.store.opened.load(Ordering::SeqCst), 1);
    assert_eq!(harness.store.open_now(), 0);
}

/// An interrupted store call stops chunk pulling.
#[test]
fn test_interrupted_scan_stops_execution() {
    let mut store = CountingStore::new(populated_store());
    store.interrupt_reads_on = Some("b".to_string());
    let harness = Harness::with_store(store);

    let mut results = harness
        .executor(ScriptedChunker::new(&["a", "b", "c"]))
        .initialize(&query(), Authorizations::default())
        .unwrap();

    let items: Vec<ExecutorResult<Entry>> = results.by_ref().collect();
    assert_eq!(items.len(), 3);
    assert!(items[2].as_ref().unwrap_err().is_interrupted());
    assert!(results.is_interrupted());
    assert!(results.is_partial());
    // Chunk "c" was never opened
    assert_eq!(harness.store.opened.load(Ordering::SeqCst), 2);
}

/// Cancellation from another thread ends the stream at the next pull.
#[test]
fn test_cancel_from_other_thread() {
    let harness = Harness::new();
    let executor = harness.executor(ScriptedChunker::new(&["a", "b", "c"]));
    let cancel = executor.cancel_handle();
    let mut results = executor
        .initialize(&query(), Authorizations::default())
        .unwrap();

    assert!(results.next().is_some());
    std::thread::spawn(move || cancel.cancel()).join().unwrap();

    assert!(results.next().is_none());
    assert!(results.is_interrupted());
    assert_eq!(harness.store.open_now(), 0);
}
