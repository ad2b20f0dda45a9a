//! Snowflake identifier base
//!
//! One fixed-width segment of 24 lowercase hex digits packing, in order:
//!
//! | bits | field                 |
//! |------|-----------------------|
//! | 20   | machine id            |
//! | 44   | millisecond timestamp |
//! | 32   | per-machine counter   |
//!
//! The segment is always longer than 8 characters, which is what lets
//! [`super::Uid::parse`] tell it apart from a hash-based base.

use std::fmt;

use super::counter::MachineId;
use super::errors::{UidError, UidResult};
use super::MILLIS_PER_DAY;

const MACHINE_DIGITS: usize = 5;
const TIMESTAMP_DIGITS: usize = 11;
const COUNTER_DIGITS: usize = 8;

/// Total width of the encoded base
pub const SNOWFLAKE_WIDTH: usize = MACHINE_DIGITS + TIMESTAMP_DIGITS + COUNTER_DIGITS;

/// Largest encodable timestamp (44 bits)
pub const MAX_TIMESTAMP_MILLIS: u64 = (1 << 44) - 1;

/// Snowflake identifier base. Field order is the comparison order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnowflakeBase {
    pub(crate) machine_id: u32,
    pub(crate) timestamp_millis: u64,
    pub(crate) counter: u32,
}

impl SnowflakeBase {
    /// Builds a base, rejecting timestamps that do not fit in 44 bits
    pub fn new(machine_id: MachineId, timestamp_millis: u64, counter: u32) -> UidResult<Self> {
        if timestamp_millis > MAX_TIMESTAMP_MILLIS {
            return Err(UidError::Configuration(format!(
                "timestamp {} exceeds the 44-bit snowflake range",
                timestamp_millis
            )));
        }
        Ok(Self {
            machine_id: machine_id.value(),
            timestamp_millis,
            counter,
        })
    }

    /// 20-bit machine identifier
    pub fn machine_id(&self) -> u32 {
        self.machine_id
    }

    /// Milliseconds since the Unix epoch
    pub fn timestamp_millis(&self) -> u64 {
        self.timestamp_millis
    }

    /// Per-machine counter within the millisecond
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Milliseconds since midnight (UTC) of the embedded timestamp
    pub fn time_of_day(&self) -> i32 {
        (self.timestamp_millis % MILLIS_PER_DAY as u64) as i32
    }

    /// Parses the base from the first part, returning it with the number of parts consumed
    pub(crate) fn parse(input: &str, parts: &[&str]) -> UidResult<(Self, usize)> {
        let first = parts
            .first()
            .ok_or_else(|| UidError::format(input, "missing snowflake segment"))?;

        let lower_hex = |b: u8| b.is_ascii_digit() || (b'a'..=b'f').contains(&b);
        if first.len() != SNOWFLAKE_WIDTH || !first.bytes().all(lower_hex) {
            return Err(UidError::format(
                input,
                format!("snowflake segment must be {} lowercase hex digits", SNOWFLAKE_WIDTH),
            ));
        }

        let (machine, rest) = first.split_at(MACHINE_DIGITS);
        let (timestamp, counter) = rest.split_at(TIMESTAMP_DIGITS);

        let machine_id = u32::from_str_radix(machine, 16)
            .map_err(|e| UidError::format(input, e.to_string()))?;
        let timestamp_millis = u64::from_str_radix(timestamp, 16)
            .map_err(|e| UidError::format(input, e.to_string()))?;
        let counter = u32::from_str_radix(counter, 16)
            .map_err(|e| UidError::format(input, e.to_string()))?;

        Ok((
            Self {
                machine_id,
                timestamp_millis,
                counter,
            },
            1,
        ))
    }
}

impl fmt::Display for SnowflakeBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:05x}{:011x}{:08x}",
            self.machine_id, self.timestamp_millis, self.counter
        )
    }
}
