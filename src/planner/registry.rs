//! Field type registry
//!
//! Maps a field name to the value types declared for it. Fields with a
//! declared type get type-specific normalization elsewhere; the literal
//! normalizer only touches fields with none.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Declared value type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Date,
    Ip,
    Geo,
    Boolean,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Ip => "ip",
            FieldType::Geo => "geo",
            FieldType::Boolean => "boolean",
        };
        write!(f, "{}", name)
    }
}

/// Read-only mapping of field name to declared types
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldTypeRegistry {
    fields: BTreeMap<String, BTreeSet<FieldType>>,
}

impl FieldTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a declared type for `field`
    pub fn declare(&mut self, field: impl Into<String>, field_type: FieldType) {
        self.fields.entry(field.into()).or_default().insert(field_type);
    }

    /// Declared types for `field`, if the field is known
    pub fn declared_types(&self, field: &str) -> Option<&BTreeSet<FieldType>> {
        self.fields.get(field)
    }

    /// True if `field` has at least one declared type
    pub fn has_declared_type(&self, field: &str) -> bool {
        self.fields.get(field).map_or(false, |types| !types.is_empty())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<S, I> FromIterator<(S, I)> for FieldTypeRegistry
where
    S: Into<String>,
    I: IntoIterator<Item = FieldType>,
{
    fn from_iter<T: IntoIterator<Item = (S, I)>>(iter: T) -> Self {
        let mut registry = Self::new();
        for (field, types) in iter {
            let entry = registry.fields.entry(field.into()).or_default();
            entry.extend(types);
        }
        registry
    }
}
