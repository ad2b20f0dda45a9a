//! Content-hash identifier base
//!
//! Form: `[+TOD.]H0.H1.H2`
//!
//! Each `Hn` is a signed 32-bit hash of the content under a distinct seed,
//! rendered in radix 36. `TOD` is the millisecond time of day in radix 36,
//! marked with a leading `+` so it can never be mistaken for a hash segment.

use std::fmt;

use sha2::{Digest, Sha256};

use super::errors::{UidError, UidResult};
use super::{MILLIS_PER_DAY, SEPARATOR};

/// Radix used for every numeric segment
pub const RADIX: u32 = 36;

/// Marker prefixed to the time-of-day segment
const TIME_MARKER: char = '+';

const SEEDS: [u32; 3] = [0x9747_b28c, 0x5bd1_e995, 0x1b87_3593];

/// Hash-based identifier base. Field order is the comparison order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HashBase {
    pub(crate) h0: i32,
    pub(crate) h1: i32,
    pub(crate) h2: i32,
    /// Milliseconds since midnight, -1 if absent
    pub(crate) time_of_day: i32,
}

impl HashBase {
    /// Hashes `content` under the three seeds
    pub fn compute(content: &[u8], time_of_day: i32) -> Self {
        Self {
            h0: seeded_hash(SEEDS[0], content),
            h1: seeded_hash(SEEDS[1], content),
            h2: seeded_hash(SEEDS[2], content),
            time_of_day: if time_of_day < 0 { -1 } else { time_of_day },
        }
    }

    /// The three hash values
    pub fn hashes(&self) -> [i32; 3] {
        [self.h0, self.h1, self.h2]
    }

    /// Time of day in milliseconds, -1 if absent
    pub fn time_of_day(&self) -> i32 {
        self.time_of_day
    }

    /// `H0.H1.H2`, recomputable from content alone
    pub fn hash_portion(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            to_radix(self.h0 as i64),
            to_radix(self.h1 as i64),
            to_radix(self.h2 as i64),
            sep = SEPARATOR
        )
    }

    /// Parses the base from the leading parts, returning it with the number of parts consumed
    pub(crate) fn parse(input: &str, parts: &[&str]) -> UidResult<(Self, usize)> {
        let (time_of_day, offset) = match parts.first() {
            Some(first) if first.starts_with(TIME_MARKER) => {
                let tod = from_radix(&first[1..])
                    .filter(|v| (0..MILLIS_PER_DAY).contains(v))
                    .ok_or_else(|| UidError::format(input, "invalid time-of-day segment"))?;
                (tod as i32, 1)
            }
            _ => (-1, 0),
        };

        if parts.len() < offset + 3 {
            return Err(UidError::format(input, "expected three hash segments"));
        }

        let mut hashes = [0i32; 3];
        for (slot, part) in hashes.iter_mut().zip(&parts[offset..offset + 3]) {
            *slot = parse_hash_segment(part)
                .ok_or_else(|| UidError::format(input, format!("invalid hash segment '{}'", part)))?;
        }

        Ok((
            Self {
                h0: hashes[0],
                h1: hashes[1],
                h2: hashes[2],
                time_of_day,
            },
            offset + 3,
        ))
    }
}

impl fmt::Display for HashBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.time_of_day >= 0 {
            write!(
                f,
                "{}{}{}",
                TIME_MARKER,
                to_radix(self.time_of_day as i64),
                SEPARATOR
            )?;
        }
        write!(f, "{}", self.hash_portion())
    }
}

fn seeded_hash(seed: u32, content: &[u8]) -> i32 {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_be_bytes());
    hasher.update(content);
    let digest = hasher.finalize();
    i32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

fn parse_hash_segment(part: &str) -> Option<i32> {
    if part.is_empty() || part.starts_with(TIME_MARKER) {
        return None;
    }
    from_radix(part).and_then(|v| i32::try_from(v).ok())
}

/// Renders a signed value in radix 36, lowercase, with a leading `-` when negative
pub fn to_radix(value: i64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let negative = value < 0;
    let mut magnitude = value.unsigned_abs();
    let mut digits = Vec::new();
    while magnitude > 0 {
        let digit = (magnitude % RADIX as u64) as u32;
        // digit < 36 always maps to a char
        digits.push(std::char::from_digit(digit, RADIX).unwrap_or('0'));
        magnitude /= RADIX as u64;
    }
    if negative {
        digits.push('-');
    }
    digits.iter().rev().collect()
}

/// Parses a radix 36 value produced by [`to_radix`].
///
/// Only the canonical rendering is accepted: uppercase digits, leading
/// zeros and explicit `+` signs are rejected.
pub fn from_radix(s: &str) -> Option<i64> {
    if s.is_empty() || s.starts_with(TIME_MARKER) {
        return None;
    }
    i64::from_str_radix(s, RADIX)
        .ok()
        .filter(|&value| to_radix(value) == s)
}
