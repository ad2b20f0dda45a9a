//! Snowflake counter sources
//!
//! A counter source hands out `(timestamp, counter)` pairs for a machine.
//! It never returns the same pair twice for a machine.
//!
//! - [`LocalCounterSource`] keeps state in process memory. A restart after a
//!   clock roll-back can reuse a pair, which is why generators built on it
//!   log a warning.
//! - [`CachedCounterSource`] additionally persists the last issued
//!   millisecond per machine through a [`CounterCache`] (a coordination
//!   service in production) and never issues a millisecond at or below the
//!   persisted one after a restart.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::errors::{UidError, UidResult};

/// A validated 20-bit, non-negative machine identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MachineId(u32);

impl MachineId {
    /// Largest machine identifier (20 bits)
    pub const MAX: u32 = (1 << 20) - 1;

    /// Validates a configured machine identifier
    pub fn new(value: i64) -> UidResult<Self> {
        if value < 0 || value > Self::MAX as i64 {
            return Err(UidError::Configuration(format!(
                "A 20-bit, non-negative, integer machine id must be configured to build snowflake UIDs (got {})",
                value
            )));
        }
        Ok(Self(value as u32))
    }

    /// Validates an optional machine identifier. Absent is a configuration error.
    pub fn from_option(value: Option<i64>) -> UidResult<Self> {
        match value {
            Some(v) => Self::new(v),
            None => Err(UidError::Configuration(
                "A 20-bit, non-negative, integer machine id must be configured to build snowflake UIDs"
                    .to_string(),
            )),
        }
    }

    /// Returns the raw value
    pub fn value(&self) -> u32 {
        self.0
    }
}

/// One issued `(timestamp, counter)` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CounterTick {
    /// Millisecond the identifier is stamped with. May be later than the
    /// requested time when the clock went backwards or the counter wrapped.
    pub timestamp_millis: u64,
    /// Counter within that millisecond
    pub counter: u32,
}

/// Capability that issues monotonic per-machine counters
pub trait CounterSource: Send + Sync {
    /// Issue the next counter for `machine_id` at `timestamp_millis`
    fn next_counter(&self, machine_id: MachineId, timestamp_millis: u64) -> UidResult<CounterTick>;

    /// True if state survives process restarts
    fn is_persistent(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy)]
struct CounterState {
    last_millis: u64,
    counter: u32,
}

/// Computes the next tick from the previous state.
///
/// A clock that moved backwards stays pinned to the last issued millisecond.
fn advance(previous: Option<CounterState>, now_millis: u64) -> CounterTick {
    match previous {
        None => CounterTick {
            timestamp_millis: now_millis,
            counter: 0,
        },
        Some(state) if now_millis > state.last_millis => CounterTick {
            timestamp_millis: now_millis,
            counter: 0,
        },
        Some(state) if state.counter < u32::MAX => CounterTick {
            timestamp_millis: state.last_millis,
            counter: state.counter + 1,
        },
        Some(state) => CounterTick {
            timestamp_millis: state.last_millis + 1,
            counter: 0,
        },
    }
}

fn poisoned() -> UidError {
    UidError::CounterUnavailable("counter state lock poisoned".to_string())
}

/// In-process counter source
#[derive(Debug, Default)]
pub struct LocalCounterSource {
    state: Mutex<HashMap<u32, CounterState>>,
}

impl LocalCounterSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CounterSource for LocalCounterSource {
    fn next_counter(&self, machine_id: MachineId, timestamp_millis: u64) -> UidResult<CounterTick> {
        let mut state = self.state.lock().map_err(|_| poisoned())?;
        let tick = advance(state.get(&machine_id.value()).copied(), timestamp_millis);
        state.insert(
            machine_id.value(),
            CounterState {
                last_millis: tick.timestamp_millis,
                counter: tick.counter,
            },
        );
        Ok(tick)
    }
}

/// Shared store for the last millisecond issued per machine
pub trait CounterCache: Send + Sync {
    /// Last persisted millisecond for the machine, if any
    fn load(&self, machine_id: MachineId) -> UidResult<Option<u64>>;

    /// Persist the last issued millisecond for the machine
    fn store(&self, machine_id: MachineId, last_millis: u64) -> UidResult<()>;
}

/// In-memory [`CounterCache`]. Stands in for the coordination service in
/// tests and single-process deployments.
#[derive(Debug, Default)]
pub struct MemoryCounterCache {
    entries: Mutex<HashMap<u32, u64>>,
}

impl MemoryCounterCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CounterCache for MemoryCounterCache {
    fn load(&self, machine_id: MachineId) -> UidResult<Option<u64>> {
        let entries = self.entries.lock().map_err(|_| poisoned())?;
        Ok(entries.get(&machine_id.value()).copied())
    }

    fn store(&self, machine_id: MachineId, last_millis: u64) -> UidResult<()> {
        let mut entries = self.entries.lock().map_err(|_| poisoned())?;
        let slot = entries.entry(machine_id.value()).or_insert(last_millis);
        *slot = (*slot).max(last_millis);
        Ok(())
    }
}

/// Counter source that persists the last issued millisecond per machine
pub struct CachedCounterSource {
    cache: Arc<dyn CounterCache>,
    state: Mutex<HashMap<u32, CounterState>>,
}

impl CachedCounterSource {
    pub fn new(cache: Arc<dyn CounterCache>) -> Self {
        Self {
            cache,
            state: Mutex::new(HashMap::new()),
        }
    }
}

impl CounterSource for CachedCounterSource {
    fn next_counter(&self, machine_id: MachineId, timestamp_millis: u64) -> UidResult<CounterTick> {
        // Held across the cache round-trip so issuance stays atomic per machine
        let mut state = self.state.lock().map_err(|_| poisoned())?;

        let previous = match state.get(&machine_id.value()) {
            Some(s) => Some(*s),
            // The counter reached in a persisted millisecond is unknown, so
            // that millisecond is treated as exhausted.
            None => self
                .cache
                .load(machine_id)?
                .map(|last_millis| CounterState {
                    last_millis,
                    counter: u32::MAX,
                }),
        };

        let tick = advance(previous, timestamp_millis);
        if previous.map_or(true, |p| tick.timestamp_millis > p.last_millis) {
            self.cache.store(machine_id, tick.timestamp_millis)?;
        }

        state.insert(
            machine_id.value(),
            CounterState {
                last_millis: tick.timestamp_millis,
                counter: tick.counter,
            },
        );
        Ok(tick)
    }

    fn is_persistent(&self) -> bool {
        true
    }
}
