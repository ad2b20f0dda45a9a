//! Chunked query execution
//!
//! A partitioner splits one logical query into an ordered sequence of
//! sub-queries. [`ChunkedQueryExecutor::initialize`] plans and opens the
//! first chunk; the returned [`ChunkedResults`] pulls the rest lazily,
//! presenting every chunk's results as one forward-only stream.
//!
//! # States
//!
//! `Uninitialized -> ChunkActive -> (ChunkExhausted -> ChunkActive)* -> Finished`
//!
//! At most one [`ScanSession`] is open at any time: the exhausted chunk's
//! session is closed before the next chunk is requested.
//!
//! # Failures
//!
//! - First chunk: every setup error propagates out of `initialize`.
//! - Chunk-local failures (`SHARD_CHUNK_SETUP_FAILED`) while planning,
//!   opening or reading a later chunk, or while reading any chunk, are
//!   logged and the chunk skipped. The stream carries on and reports
//!   itself as partial.
//! - Store failures that are not chunk-local propagate, whether raised on
//!   open or on read.
//! - Interruption (store call or [`CancelHandle`]) stops chunk pulling.
//! - Any other error is yielded once, then the stream ends.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::errors::{ExecutorError, ExecutorResult};
use super::query::{
    Authorizations, Entry, QueryConfiguration, QuerySettings, FORCED_SYNTAX,
    MAX_RESULTS_OVERRIDE, QUERY_SYNTAX,
};
use super::session::ScanSession;
use super::traits::{Chunker, QueryLogic, ScanStore};
use crate::config::KernelConfig;
use crate::observability::{Event, Logger, MetricsRegistry, ObservationScope};

/// Suffix appended to the caller's query name for the base query
const CHUNK_SUFFIX: &str = "-chunk";

/// Cooperative cancellation flag shared with other threads
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that the stream stop at its next pull
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Executes a query chunk by chunk
pub struct ChunkedQueryExecutor {
    logic: Box<dyn QueryLogic>,
    chunker: Box<dyn Chunker>,
    store: Arc<dyn ScanStore>,
    max_results: Option<u64>,
    metrics: Arc<MetricsRegistry>,
    cancel: CancelHandle,
}

impl ChunkedQueryExecutor {
    pub fn new(
        logic: Box<dyn QueryLogic>,
        chunker: Box<dyn Chunker>,
        store: Arc<dyn ScanStore>,
    ) -> Self {
        Self {
            logic,
            chunker,
            store,
            max_results: None,
            metrics: Arc::new(MetricsRegistry::new()),
            cancel: CancelHandle::new(),
        }
    }

    /// Applies the configured result cap
    pub fn with_config(self, config: &KernelConfig) -> Self {
        self.with_max_results(config.result_cap())
    }

    /// Caps the total number of entries returned, `None` for unlimited
    pub fn with_max_results(mut self, max_results: Option<u64>) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Handle that cancels the stream produced by this executor
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Plans the query, runs the partitioner's pre-pass if it asks for one,
    /// and opens the first chunk
    pub fn initialize(
        self,
        settings: &QuerySettings,
        authorizations: Authorizations,
    ) -> ExecutorResult<ChunkedResults> {
        let id = settings.id.to_string();
        let scope = ObservationScope::with_fields(
            Event::QueryInitialize.as_str(),
            &[("query", settings.name.as_str()), ("query_id", id.as_str())],
        );

        match self.initialize_inner(settings, authorizations) {
            Ok(results) => {
                scope.complete_with_fields(&[
                    ("table", results.planning.table.as_str()),
                    ("ranges", &results.planning.ranges.len().to_string()),
                ]);
                Ok(results)
            }
            Err(err) => {
                scope.fail(&err.to_string());
                Err(err)
            }
        }
    }

    fn initialize_inner(
        mut self,
        settings: &QuerySettings,
        authorizations: Authorizations,
    ) -> ExecutorResult<ChunkedResults> {
        let mut base = settings.duplicate(format!("{}{}", settings.name, CHUNK_SUFFIX));
        base.set_parameter(QUERY_SYNTAX, FORCED_SYNTAX);
        self.chunker.set_base_query(&base);

        let max_results = resolve_max_results(self.max_results, &base);

        if self.chunker.pre_initialize_query_logic() {
            Logger::event(Event::ChunkerPreInitialize, &[("query", base.name.as_str())]);
            let config = self.logic.initialize(&base, &authorizations)?;
            if !config.has_work() {
                return Ok(ChunkedResults::empty(self, base, authorizations, config));
            }

            let mut session = ScanSession::open(
                self.store.as_ref(),
                &config.table,
                &config.authorizations,
                config.ranges.clone(),
                Some(Arc::clone(&self.metrics)),
            )?;
            let observed = self.chunker.initialize(&config, &mut session);
            session.close();
            observed?;
        }

        let mut results = ChunkedResults {
            logic: self.logic,
            chunker: self.chunker,
            store: self.store,
            metrics: self.metrics,
            cancel: self.cancel,
            authorizations,
            planning: placeholder_configuration(&base),
            base,
            session: None,
            chunk: 0,
            chunk_entries: 0,
            skipped_chunks: 0,
            remaining: max_results,
            interrupted: false,
            finished: false,
        };

        let first = match results.chunker.next_chunk() {
            Some(chunk) => chunk,
            None => {
                Logger::event(
                    Event::ChunkFallbackBaseQuery,
                    &[("query", results.base.name.as_str())],
                );
                results.base.clone()
            }
        };
        results.planning = results.start_chunk(&first)?;
        Ok(results)
    }
}

/// Applies a valid `max.results.override` if it is below `configured`
fn resolve_max_results(configured: Option<u64>, settings: &QuerySettings) -> Option<u64> {
    let raw = match settings.parameter(MAX_RESULTS_OVERRIDE).map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return configured,
    };

    match raw.parse::<u64>() {
        Ok(value) if configured.map_or(true, |cap| value < cap) => Some(value),
        Ok(_) => configured,
        Err(_) => {
            Logger::event(
                Event::MaxResultsOverrideInvalid,
                &[
                    ("value", raw),
                    ("using", &configured.map_or("unlimited".to_string(), |c| c.to_string())),
                ],
            );
            configured
        }
    }
}

fn placeholder_configuration(base: &QuerySettings) -> QueryConfiguration {
    QueryConfiguration {
        query_id: base.id,
        table: String::new(),
        authorizations: Authorizations::default(),
        ranges: Vec::new(),
    }
}

/// Lazily advancing result stream over every chunk of a query
pub struct ChunkedResults {
    logic: Box<dyn QueryLogic>,
    chunker: Box<dyn Chunker>,
    store: Arc<dyn ScanStore>,
    metrics: Arc<MetricsRegistry>,
    cancel: CancelHandle,
    authorizations: Authorizations,
    base: QuerySettings,
    planning: QueryConfiguration,
    session: Option<ScanSession>,
    /// 1-based index of the chunk in progress
    chunk: usize,
    chunk_entries: u64,
    skipped_chunks: usize,
    remaining: Option<u64>,
    interrupted: bool,
    finished: bool,
}

impl ChunkedResults {
    fn empty(
        executor: ChunkedQueryExecutor,
        base: QuerySettings,
        authorizations: Authorizations,
        planning: QueryConfiguration,
    ) -> Self {
        Self {
            logic: executor.logic,
            chunker: executor.chunker,
            store: executor.store,
            metrics: executor.metrics,
            cancel: executor.cancel,
            authorizations,
            base,
            planning,
            session: None,
            chunk: 0,
            chunk_entries: 0,
            skipped_chunks: 0,
            remaining: None,
            interrupted: false,
            finished: true,
        }
    }

    /// Planning output of the first chunk (or of the base query when the
    /// pre-pass found nothing to scan)
    pub fn planning(&self) -> &QueryConfiguration {
        &self.planning
    }

    /// Base query as rewritten for chunking
    pub fn base_query(&self) -> &QuerySettings {
        &self.base
    }

    /// Chunks dropped after a setup failure
    pub fn skipped_chunks(&self) -> usize {
        self.skipped_chunks
    }

    /// True if any chunk was skipped or execution was interrupted
    pub fn is_partial(&self) -> bool {
        self.skipped_chunks > 0 || self.interrupted
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Identity of the open scan session, if any
    pub fn current_session(&self) -> Option<&ScanSession> {
        self.session.as_ref()
    }

    /// Abandons execution and releases the open session. Idempotent.
    pub fn close(&mut self) {
        self.close_session();
        self.finished = true;
    }

    /// Plans one chunk and opens its session. A chunk with no ranges leaves
    /// no session open.
    fn start_chunk(&mut self, settings: &QuerySettings) -> ExecutorResult<QueryConfiguration> {
        self.chunk += 1;
        self.chunk_entries = 0;

        let mut settings = settings.clone();
        settings.set_parameter(QUERY_SYNTAX, FORCED_SYNTAX);

        let config = self.logic.initialize(&settings, &self.authorizations)?;
        if config.has_work() {
            self.session = Some(ScanSession::open(
                self.store.as_ref(),
                &config.table,
                &config.authorizations,
                config.ranges.clone(),
                Some(Arc::clone(&self.metrics)),
            )?);
        }

        self.metrics.increment_chunks_started();
        Logger::event(
            Event::ChunkStart,
            &[
                ("chunk", &self.chunk.to_string()),
                ("query", settings.name.as_str()),
                ("table", config.table.as_str()),
                ("ranges", &config.ranges.len().to_string()),
            ],
        );
        if !config.has_work() {
            self.complete_chunk();
        }
        Ok(config)
    }

    fn complete_chunk(&mut self) {
        self.close_session();
        self.metrics.increment_chunks_completed();
        Logger::event(
            Event::ChunkComplete,
            &[
                ("chunk", &self.chunk.to_string()),
                ("entries", &self.chunk_entries.to_string()),
            ],
        );
    }

    fn close_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close();
        }
    }

    fn interrupt(&mut self, reason: &str) {
        self.interrupted = true;
        self.close();
        Logger::event(
            Event::ExecutionInterrupted,
            &[("chunk", &self.chunk.to_string()), ("reason", reason)],
        );
    }

    fn skip_chunk(&mut self, err: &ExecutorError) {
        self.close_session();
        self.skipped_chunks += 1;
        self.metrics.increment_chunks_skipped();
        Logger::event(
            Event::ChunkSkipped,
            &[
                ("chunk", &self.chunk.to_string()),
                ("code", err.code().code()),
                ("reason", err.message()),
            ],
        );
    }

    /// Ends the stream after yielding `err`
    fn fail(&mut self, err: ExecutorError) -> Option<ExecutorResult<Entry>> {
        if err.is_interrupted() {
            self.interrupt(err.message());
        } else {
            self.close();
        }
        Some(Err(err))
    }
}

impl Iterator for ChunkedResults {
    type Item = ExecutorResult<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished {
                return None;
            }
            if self.cancel.is_cancelled() {
                self.interrupt("cancelled");
                return None;
            }
            if self.remaining == Some(0) {
                self.close();
                return None;
            }

            if let Some(session) = self.session.as_mut() {
                match session.next() {
                    Some(Ok(entry)) => {
                        self.chunk_entries += 1;
                        if let Some(remaining) = self.remaining.as_mut() {
                            *remaining -= 1;
                        }
                        self.metrics.increment_entries_returned();
                        return Some(Ok(entry));
                    }
                    // A chunk that fails mid-scan is dropped like a setup failure
                    Some(Err(err)) if err.is_chunk_local() => self.skip_chunk(&err),
                    Some(Err(err)) => return self.fail(err),
                    None => self.complete_chunk(),
                }
            }

            // Current chunk exhausted: its session is already closed
            let Some(chunk) = self.chunker.next_chunk() else {
                self.finished = true;
                return None;
            };
            match self.start_chunk(&chunk) {
                Ok(_) => {}
                Err(err) if err.is_chunk_local() => self.skip_chunk(&err),
                Err(err) => return self.fail(err),
            }
        }
    }
}

impl Drop for ChunkedResults {
    fn drop(&mut self) {
        self.close_session();
    }
}
