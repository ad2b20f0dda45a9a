//! The `Uid` type: construction, parsing, ordering and string form
//!
//! String grammar: `BASE[.EXTRA...]`. The variant is never tagged; it is
//! recovered from the shape of the string (see [`Uid::parse`]).

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::counter::{CounterSource, MachineId};
use super::errors::{UidError, UidResult};
use super::hash::HashBase;
use super::snowflake::SnowflakeBase;
use super::{MILLIS_PER_DAY, SEPARATOR};

/// Identifier encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UidVariant {
    /// Three content hashes, optional time of day
    HashBased,
    /// Machine id, millisecond timestamp and counter
    Snowflake,
}

/// Identifier base, one arm per variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UidBase {
    Hash(HashBase),
    Snowflake(SnowflakeBase),
}

impl fmt::Display for UidBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UidBase::Hash(base) => base.fmt(f),
            UidBase::Snowflake(base) => base.fmt(f),
        }
    }
}

/// A globally distinguishing record identifier. Immutable once built.
///
/// Ordering is by variant, then base, then extra (absent extra first).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Uid {
    base: UidBase,
    extra: Option<String>,
}

impl Uid {
    /// Builds a hash-based identifier from content bytes.
    ///
    /// Deterministic: the same content, timestamp and extras always give the
    /// same identifier. Without a timestamp the time of day is -1.
    pub fn new_hash(content: &[u8], timestamp: Option<DateTime<Utc>>, extras: &[&str]) -> Uid {
        let time_of_day = timestamp.map(time_of_day_millis).unwrap_or(-1);
        Uid {
            base: UidBase::Hash(HashBase::compute(content, time_of_day)),
            extra: merge_extras(extras),
        }
    }

    /// Builds a snowflake identifier.
    ///
    /// Fails with a configuration error before anything is issued when the
    /// machine id is absent, negative or wider than 20 bits.
    pub fn new_snowflake(
        machine_id: Option<i64>,
        timestamp: DateTime<Utc>,
        counters: &dyn CounterSource,
        extras: &[&str],
    ) -> UidResult<Uid> {
        let machine_id = MachineId::from_option(machine_id)?;
        Self::new_snowflake_for(machine_id, timestamp, counters, extras)
    }

    /// Builds a snowflake identifier for an already validated machine id
    pub fn new_snowflake_for(
        machine_id: MachineId,
        timestamp: DateTime<Utc>,
        counters: &dyn CounterSource,
        extras: &[&str],
    ) -> UidResult<Uid> {
        let millis = u64::try_from(timestamp.timestamp_millis()).map_err(|_| {
            UidError::Configuration(format!("timestamp {} precedes the epoch", timestamp))
        })?;
        let tick = counters.next_counter(machine_id, millis)?;
        let base = SnowflakeBase::new(machine_id, tick.timestamp_millis, tick.counter)?;
        Ok(Uid {
            base: UidBase::Snowflake(base),
            extra: merge_extras(extras),
        })
    }

    /// Parses the string form, keeping up to `max_extra_parts` extra parts.
    ///
    /// `-1` (any negative) keeps all extras, `0` keeps none, `n` keeps up to `n`.
    ///
    /// Fewer than three parts, or a first part longer than 8 characters,
    /// parses as a snowflake; anything else as hash-based.
    pub fn parse(s: &str, max_extra_parts: i32) -> UidResult<Uid> {
        if s.is_empty() {
            return Err(UidError::format(s, "empty input"));
        }

        let parts: Vec<&str> = s.split(SEPARATOR).collect();
        let (base, consumed) = if parts.len() < 3 || parts[0].len() > 8 {
            let (base, consumed) = SnowflakeBase::parse(s, &parts)?;
            (UidBase::Snowflake(base), consumed)
        } else {
            let (base, consumed) = HashBase::parse(s, &parts)?;
            (UidBase::Hash(base), consumed)
        };

        let extras = &parts[consumed..];
        let keep = if max_extra_parts < 0 {
            extras.len()
        } else {
            extras.len().min(max_extra_parts as usize)
        };

        Ok(Uid {
            base,
            extra: merge_extras(&extras[..keep]),
        })
    }

    /// Parses only the base, dropping every extra part
    pub fn parse_base(s: &str) -> UidResult<Uid> {
        Self::parse(s, 0)
    }

    /// Which encoding this identifier uses
    pub fn variant(&self) -> UidVariant {
        match self.base {
            UidBase::Hash(_) => UidVariant::HashBased,
            UidBase::Snowflake(_) => UidVariant::Snowflake,
        }
    }

    /// The decoded base
    pub fn base(&self) -> &UidBase {
        &self.base
    }

    /// Milliseconds since midnight, -1 if absent
    pub fn time_of_day(&self) -> i32 {
        match &self.base {
            UidBase::Hash(base) => base.time_of_day(),
            UidBase::Snowflake(base) => base.time_of_day(),
        }
    }

    /// Separator-joined extra, if any
    pub fn extra(&self) -> Option<&str> {
        self.extra.as_deref()
    }

    /// Extra split into its parts
    pub fn extra_parts(&self) -> impl Iterator<Item = &str> {
        self.extra.iter().flat_map(|e| e.split(SEPARATOR))
    }

    /// Portion used for shard routing.
    ///
    /// Hash-based: the three hashes, recomputable from content alone.
    /// Snowflake: the whole base, which embeds the timestamp.
    pub fn sharded_portion(&self) -> String {
        match &self.base {
            UidBase::Hash(base) => base.hash_portion(),
            UidBase::Snowflake(base) => base.to_string(),
        }
    }

    /// The base in string form, without extras
    pub fn base_uid(&self) -> String {
        self.base.to_string()
    }

    /// A copy with the extra dropped
    pub fn without_extra(&self) -> Uid {
        Uid {
            base: self.base,
            extra: None,
        }
    }

    /// Null-aware comparison: absent sorts before present, two absents are equal
    pub fn compare_optional(a: Option<&Uid>, b: Option<&Uid>) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => a.cmp(b),
        }
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        if let Some(extra) = &self.extra {
            write!(f, "{}{}", SEPARATOR, extra)?;
        }
        Ok(())
    }
}

impl FromStr for Uid {
    type Err = UidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uid::parse(s, -1)
    }
}

impl TryFrom<String> for Uid {
    type Error = UidError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Uid> for String {
    fn from(uid: Uid) -> Self {
        uid.to_string()
    }
}

/// Joins extras with the separator. No extras means no extra.
fn merge_extras(extras: &[&str]) -> Option<String> {
    if extras.is_empty() {
        None
    } else {
        Some(extras.join(&SEPARATOR.to_string()))
    }
}

fn time_of_day_millis(timestamp: DateTime<Utc>) -> i32 {
    timestamp.timestamp_millis().rem_euclid(MILLIS_PER_DAY) as i32
}
