//! Observability subsystem for shardscan
//!
//! This module provides:
//! - Structured logging (one JSON object per line)
//! - Typed lifecycle events
//! - Monotonic counters
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on execution
//! 3. No async or background threads
//!
//! # Usage
//!
//! ```ignore
//! use shardscan::observability::{Event, Logger, ObservationScope};
//!
//! Logger::event(Event::ChunkSkipped, &[("chunk", "2"), ("reason", "planner failed")]);
//!
//! let scope = ObservationScope::new("QUERY_INITIALIZE");
//! // ... do work ...
//! scope.complete();
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::{ObservationScope, Timer};

/// Log a lifecycle event with fields
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::event(event, fields);
}
