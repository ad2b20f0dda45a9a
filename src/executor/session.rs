//! Scan sessions
//!
//! A session owns one open scan bound to a table, an authorization set and
//! a non-empty range list. Its identity is a CRC32 over those three, stable
//! across processes, so sessions can be pooled by key.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use crc32fast::Hasher as Crc32;

use super::errors::{ExecutorError, ExecutorResult};
use super::query::{Authorizations, Entry, KeyRange};
use super::traits::{ScanCursor, ScanStore};
use crate::observability::{Event, Logger, MetricsRegistry, Timer};

/// One open scan. Closing is idempotent and also happens on drop.
pub struct ScanSession {
    table: String,
    authorizations: Authorizations,
    ranges: Vec<KeyRange>,
    identity: u32,
    timer: Timer,
    cursor: Option<ScanCursor>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl ScanSession {
    /// Opens a scan. Fails with an invalid session error if `ranges` is empty.
    pub fn open(
        store: &dyn ScanStore,
        table: &str,
        authorizations: &Authorizations,
        ranges: Vec<KeyRange>,
        metrics: Option<Arc<MetricsRegistry>>,
    ) -> ExecutorResult<Self> {
        if ranges.is_empty() {
            return Err(ExecutorError::invalid_session(format!(
                "scan of '{}' requires at least one range",
                table
            )));
        }

        let identity = Self::identity_of(table, authorizations, &ranges);
        let cursor = store.open_scan(table, authorizations, &ranges)?;

        Logger::event(
            Event::SessionOpen,
            &[
                ("table", table),
                ("ranges", &ranges.len().to_string()),
                ("identity", &format!("{:08x}", identity)),
            ],
        );
        if let Some(metrics) = &metrics {
            metrics.increment_sessions_opened();
        }

        Ok(Self {
            table: table.to_string(),
            authorizations: authorizations.clone(),
            ranges,
            identity,
            timer: Timer::new(),
            cursor: Some(cursor),
            metrics,
        })
    }

    /// Identity of a session over `(table, authorizations, ranges)`
    pub fn identity_of(table: &str, authorizations: &Authorizations, ranges: &[KeyRange]) -> u32 {
        let mut crc = Crc32::new();
        crc.update(table.as_bytes());
        crc.update(&[0]);
        for label in authorizations.labels() {
            crc.update(label.as_bytes());
            crc.update(&[0x1f]);
        }
        crc.update(&[0]);
        for range in ranges {
            // Bound markers keep an absent bound distinct from an empty one
            for bound in [&range.start, &range.end] {
                match bound {
                    Some(value) => {
                        crc.update(&[1]);
                        crc.update(value.as_bytes());
                    }
                    None => crc.update(&[2]),
                }
                crc.update(&[0x1f]);
            }
        }
        crc.finalize()
    }

    pub fn identity(&self) -> u32 {
        self.identity
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn authorizations(&self) -> &Authorizations {
        &self.authorizations
    }

    pub fn ranges(&self) -> &[KeyRange] {
        &self.ranges
    }

    pub fn is_open(&self) -> bool {
        self.cursor.is_some()
    }

    /// Time since the session opened
    pub fn elapsed(&self) -> Duration {
        self.timer.elapsed()
    }

    /// Releases the scan. No-op if already closed.
    pub fn close(&mut self) {
        if self.cursor.take().is_none() {
            return;
        }
        Logger::event(
            Event::SessionClose,
            &[
                ("table", &self.table),
                ("identity", &format!("{:08x}", self.identity)),
                ("elapsed_ms", &self.timer.elapsed_ms()),
            ],
        );
        if let Some(metrics) = &self.metrics {
            metrics.increment_sessions_closed();
        }
    }
}

impl Iterator for ScanSession {
    type Item = ExecutorResult<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.as_mut()?.next()
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl PartialEq for ScanSession {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
            && self.table == other.table
            && self.authorizations == other.authorizations
            && self.ranges == other.ranges
    }
}

impl Eq for ScanSession {}

impl Hash for ScanSession {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.identity);
    }
}

impl fmt::Debug for ScanSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanSession")
            .field("table", &self.table)
            .field("authorizations", &self.authorizations)
            .field("ranges", &self.ranges)
            .field("identity", &format_args!("{:08x}", self.identity))
            .field("open", &self.is_open())
            .finish()
    }
}
