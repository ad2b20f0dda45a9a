//! Metrics registry for the query execution kernel
//!
//! - Counters only, monotonic
//! - Reset only on process start
//! - Thread-safe, relaxed atomics

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters for chunked execution, scan sessions and normalization
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Chunks whose setup succeeded
    chunks_started: AtomicU64,
    /// Chunks whose results were exhausted
    chunks_completed: AtomicU64,
    /// Chunks skipped after a setup failure
    chunks_skipped: AtomicU64,
    /// Scan sessions opened
    sessions_opened: AtomicU64,
    /// Scan sessions closed
    sessions_closed: AtomicU64,
    /// Key/value entries handed to the caller
    entries_returned: AtomicU64,
    /// String literals rewritten as numbers
    literals_rewritten: AtomicU64,
    /// Identifiers generated
    uids_generated: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment chunks started
    pub fn increment_chunks_started(&self) {
        self.chunks_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment chunks completed
    pub fn increment_chunks_completed(&self) {
        self.chunks_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment chunks skipped
    pub fn increment_chunks_skipped(&self) {
        self.chunks_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment sessions opened
    pub fn increment_sessions_opened(&self) {
        self.sessions_opened.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment sessions closed
    pub fn increment_sessions_closed(&self) {
        self.sessions_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment entries returned
    pub fn increment_entries_returned(&self) {
        self.entries_returned.fetch_add(1, Ordering::Relaxed);
    }

    /// Add rewritten literals
    pub fn add_literals_rewritten(&self, count: u64) {
        self.literals_rewritten.fetch_add(count, Ordering::Relaxed);
    }

    /// Increment identifiers generated
    pub fn increment_uids_generated(&self) {
        self.uids_generated.fetch_add(1, Ordering::Relaxed);
    }

    /// Sessions currently open (opened minus closed)
    pub fn sessions_open(&self) -> u64 {
        let opened = self.sessions_opened.load(Ordering::Relaxed);
        let closed = self.sessions_closed.load(Ordering::Relaxed);
        opened.saturating_sub(closed)
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            chunks_started: self.chunks_started.load(Ordering::Relaxed),
            chunks_completed: self.chunks_completed.load(Ordering::Relaxed),
            chunks_skipped: self.chunks_skipped.load(Ordering::Relaxed),
            sessions_opened: self.sessions_opened.load(Ordering::Relaxed),
            sessions_closed: self.sessions_closed.load(Ordering::Relaxed),
            entries_returned: self.entries_returned.load(Ordering::Relaxed),
            literals_rewritten: self.literals_rewritten.load(Ordering::Relaxed),
            uids_generated: self.uids_generated.load(Ordering::Relaxed),
        }
    }

    /// Current snapshot rendered as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub chunks_started: u64,
    pub chunks_completed: u64,
    pub chunks_skipped: u64,
    pub sessions_opened: u64,
    pub sessions_closed: u64,
    pub entries_returned: u64,
    pub literals_rewritten: u64,
    pub uids_generated: u64,
}
