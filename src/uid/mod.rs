//! Record identifiers (UIDs)
//!
//! Two interchangeable encodings share one dot-separated string grammar:
//!
//! - Hash-based: `[+TOD.]H0.H1.H2[.EXTRA...]`, three seeded 32-bit content
//!   hashes in radix 36, optionally preceded by the time of day.
//! - Snowflake: `MMMMMTTTTTTTTTTTCCCCCCCC[.EXTRA...]`, a single 24-digit hex
//!   segment packing machine id, millisecond timestamp and counter.
//!
//! The query layer treats identifiers opaquely; ingest picks the encoding
//! through [`UidGenerator::from_config`].
//!
//! # Variant detection
//!
//! Parsing never reads a tag. Fewer than three parts, or a first part longer
//! than 8 characters, means snowflake. Previously persisted identifiers
//! depend on this rule, so it must not change.

mod counter;
mod errors;
mod generator;
mod hash;
mod identifier;
mod snowflake;

pub use counter::{
    CachedCounterSource, CounterCache, CounterSource, CounterTick, LocalCounterSource,
    MachineId, MemoryCounterCache,
};
pub use errors::{UidError, UidResult};
pub use generator::{UidGenerator, UidType};
pub use hash::{from_radix, to_radix, HashBase, RADIX};
pub use identifier::{Uid, UidBase, UidVariant};
pub use snowflake::{SnowflakeBase, MAX_TIMESTAMP_MILLIS, SNOWFLAKE_WIDTH};

/// Separator between base segments and extras
pub const SEPARATOR: char = '.';

/// Milliseconds in one day
pub const MILLIS_PER_DAY: i64 = 86_400_000;
