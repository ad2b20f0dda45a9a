//! A single index hole: one rectangle in (value × date) space that is known
//! to be missing from the secondary index.
//!
//! All comparisons are lexicographic on the string bounds. Callers normalize
//! values and dates into comparable forms first.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::errors::{HoleError, HoleResult};

/// Date format of hole bounds
pub const HOLE_DATE_FORMAT: &str = "%Y%m%d";

/// One known gap in index coverage
///
/// Sorts by `start_value`, `end_value`, `start_date`, `end_date`. Sweeps over
/// a hole list rely on this order to stop early.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexHole {
    start_value: String,
    end_value: String,
    start_date: String,
    end_date: String,
}

impl IndexHole {
    /// Builds a hole from `[start, end]` date and value ranges without validation
    pub fn new(date_range: [&str; 2], value_range: [&str; 2]) -> Self {
        Self {
            start_value: value_range[0].to_string(),
            end_value: value_range[1].to_string(),
            start_date: date_range[0].to_string(),
            end_date: date_range[1].to_string(),
        }
    }

    /// Builds a hole, checking that dates are `yyyyMMdd` and no range is inverted
    pub fn try_new(date_range: [&str; 2], value_range: [&str; 2]) -> HoleResult<Self> {
        let hole = Self::new(date_range, value_range);
        hole.validate()?;
        Ok(hole)
    }

    /// Checks date format and range orientation
    pub fn validate(&self) -> HoleResult<()> {
        for date in [&self.start_date, &self.end_date] {
            if date.len() != 8 || NaiveDate::parse_from_str(date, HOLE_DATE_FORMAT).is_err() {
                return Err(HoleError::InvalidDate(date.clone()));
            }
        }
        if self.start_date > self.end_date {
            return Err(HoleError::InvertedRange {
                kind: "date",
                start: self.start_date.clone(),
                end: self.end_date.clone(),
            });
        }
        if self.start_value > self.end_value {
            return Err(HoleError::InvertedRange {
                kind: "value",
                start: self.start_value.clone(),
                end: self.end_value.clone(),
            });
        }
        Ok(())
    }

    pub fn start_value(&self) -> &str {
        &self.start_value
    }

    pub fn end_value(&self) -> &str {
        &self.end_value
    }

    pub fn start_date(&self) -> &str {
        &self.start_date
    }

    pub fn end_date(&self) -> &str {
        &self.end_date
    }

    /// True if `value` lies in the value range and the date ranges intersect
    pub fn overlaps(&self, query_start: &str, query_end: &str, value: &str) -> bool {
        self.start_value.as_str() <= value
            && self.end_value.as_str() >= value
            && self.overlaps_dates(query_start, query_end)
    }

    /// True if `[lower, upper]` intersects the value range and the date ranges intersect
    pub fn overlaps_range(
        &self,
        query_start: &str,
        query_end: &str,
        lower: &str,
        upper: &str,
    ) -> bool {
        self.start_value.as_str() <= upper
            && self.end_value.as_str() >= lower
            && self.overlaps_dates(query_start, query_end)
    }

    fn overlaps_dates(&self, query_start: &str, query_end: &str) -> bool {
        self.start_date.as_str() <= query_end && self.end_date.as_str() >= query_start
    }

    /// True if the whole value range sorts strictly below `value`
    pub fn before(&self, value: &str) -> bool {
        self.end_value.as_str() < value
    }

    /// True if the whole value range sorts strictly above `value`
    pub fn after(&self, value: &str) -> bool {
        self.start_value.as_str() > value
    }
}

impl Ord for IndexHole {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start_value
            .cmp(&other.start_value)
            .then_with(|| self.end_value.cmp(&other.end_value))
            .then_with(|| self.start_date.cmp(&other.start_date))
            .then_with(|| self.end_date.cmp(&other.end_date))
    }
}

impl PartialOrd for IndexHole {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for IndexHole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "([{},{}],[{},{}])",
            self.start_value, self.end_value, self.start_date, self.end_date
        )
    }
}
