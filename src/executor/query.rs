//! Query settings and scan primitives shared by the executor and its seams

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Parameter naming the expression syntax of a query
pub const QUERY_SYNTAX: &str = "query.syntax";

/// Parameter lowering the configured result cap for one query
pub const MAX_RESULTS_OVERRIDE: &str = "max.results.override";

/// Syntax forced onto chunked queries so upstream auto-detection leaves
/// the partitioner's selectors alone
pub const FORCED_SYNTAX: &str = "JEXL";

/// A logical query as submitted by a caller or produced by a partitioner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySettings {
    pub id: Uuid,
    pub name: String,
    pub expression: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl QuerySettings {
    pub fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            expression: expression.into(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_parameter(key, value);
        self
    }

    /// Replaces any existing value for `key`
    pub fn set_parameter(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.parameters.insert(key.into(), value.into());
    }

    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    /// Copy under a new name and a fresh id
    pub fn duplicate(&self, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            expression: self.expression.clone(),
            parameters: self.parameters.clone(),
        }
    }
}

/// Set of visibility labels a scan may read
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Authorizations(BTreeSet<String>);

impl Authorizations {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(labels.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.contains(label)
    }

    /// Labels in sorted order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Evaluates a visibility expression: empty (public), a single label,
    /// `a&b` (all required) or `a|b` (any suffices). Mixed operators are
    /// not visible to anyone.
    pub fn can_see(&self, visibility: &str) -> bool {
        let visibility = visibility.trim();
        if visibility.is_empty() {
            return true;
        }
        match (visibility.contains('&'), visibility.contains('|')) {
            (false, false) => self.contains(visibility),
            (true, false) => visibility.split('&').all(|l| self.contains(l.trim())),
            (false, true) => visibility.split('|').any(|l| self.contains(l.trim())),
            (true, true) => false,
        }
    }
}

impl fmt::Display for Authorizations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.labels().collect();
        write!(f, "{}", labels.join(","))
    }
}

/// Store key, ordered by row, then column, then visibility
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Key {
    pub row: String,
    pub column: String,
    #[serde(default)]
    pub visibility: String,
}

impl Key {
    pub fn new(row: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            row: row.into(),
            column: column.into(),
            visibility: String::new(),
        }
    }

    pub fn with_visibility(mut self, visibility: impl Into<String>) -> Self {
        self.visibility = visibility.into();
        self
    }
}

/// One key/value pair returned by a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub key: Key,
    pub value: String,
}

impl Entry {
    pub fn new(key: Key, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

/// Row range `[start, end)`. An absent bound is unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl KeyRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: Some(start.into()),
            end: Some(end.into()),
        }
    }

    /// Exactly one row
    pub fn row(row: impl Into<String>) -> Self {
        let row = row.into();
        // Smallest string sorting after every key of `row`
        let end = format!("{}\0", row);
        Self {
            start: Some(row),
            end: Some(end),
        }
    }

    pub fn all() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    pub fn contains(&self, row: &str) -> bool {
        self.start.as_deref().map_or(true, |s| row >= s)
            && self.end.as_deref().map_or(true, |e| row < e)
    }
}

impl fmt::Display for KeyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{},{})",
            self.start.as_deref().unwrap_or("-inf"),
            self.end.as_deref().unwrap_or("+inf")
        )
    }
}

/// Planning output for one query or chunk: what to scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfiguration {
    pub query_id: Uuid,
    pub table: String,
    pub authorizations: Authorizations,
    /// Empty when the query has nothing to scan
    pub ranges: Vec<KeyRange>,
}

impl QueryConfiguration {
    pub fn has_work(&self) -> bool {
        !self.ranges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_gets_new_identity() {
        let settings = QuerySettings::new("q", "AGE == 42").with_parameter("a", "1");
        let copy = settings.duplicate("q-chunk");

        assert_ne!(copy.id, settings.id);
        assert_eq!(copy.name, "q-chunk");
        assert_eq!(copy.expression, settings.expression);
        assert_eq!(copy.parameter("a"), Some("1"));
    }

    #[test]
    fn test_set_parameter_replaces() {
        let mut settings = QuerySettings::new("q", "x").with_parameter(QUERY_SYNTAX, "LUCENE");
        settings.set_parameter(QUERY_SYNTAX, FORCED_SYNTAX);
        assert_eq!(settings.parameter(QUERY_SYNTAX), Some("JEXL"));
        assert_eq!(settings.parameters.len(), 1);
    }

    #[test]
    fn test_visibility() {
        let auths = Authorizations::new(["A", "B"]);
        assert!(auths.can_see(""));
        assert!(auths.can_see("A"));
        assert!(auths.can_see("A&B"));
        assert!(!auths.can_see("A&C"));
        assert!(auths.can_see("C|B"));
        assert!(!auths.can_see("C"));
        assert!(!auths.can_see("A&B|C"));
        assert_eq!(auths.to_string(), "A,B");
    }

    #[test]
    fn test_key_range() {
        let range = KeyRange::new("20200101", "20200103");
        assert!(range.contains("20200101"));
        assert!(range.contains("20200102_5"));
        assert!(!range.contains("20200103"));

        let row = KeyRange::row("r1");
        assert!(row.contains("r1"));
        assert!(!row.contains("r10"));
        assert!(KeyRange::all().contains("anything"));
        assert_eq!(KeyRange::all().to_string(), "[-inf,+inf)");
    }
}
