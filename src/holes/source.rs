//! Where index holes come from
//!
//! Production deployments compute holes from index metadata tables. The
//! kernel only needs a per-field listing, so the source sits behind a trait.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::RwLock;

use super::errors::{HoleError, HoleResult};
use super::hole::IndexHole;
use super::set::IndexHoleSet;
use crate::observability::{Event, Logger};

/// Supplies known index holes per field
pub trait HoleSource: Send + Sync {
    /// Holes for `field`, in any order. Unknown fields have none.
    fn holes_for(&self, field: &str) -> HoleResult<IndexHoleSet>;
}

/// In-memory hole listing keyed by field name
#[derive(Debug, Default)]
pub struct MemoryHoleSource {
    holes: RwLock<HashMap<String, Vec<IndexHole>>>,
}

impl MemoryHoleSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a hole for `field`
    pub fn insert(&self, field: &str, hole: IndexHole) -> HoleResult<()> {
        let mut holes = self
            .holes
            .write()
            .map_err(|_| HoleError::Source("hole listing lock poisoned".into()))?;
        holes.entry(field.to_string()).or_default().push(hole);
        Ok(())
    }

    /// Loads a JSON object of `{ "FIELD": [hole, ...] }` from a file
    pub fn load(path: &Path) -> HoleResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        let listing: HashMap<String, Vec<IndexHole>> = serde_json::from_reader(reader)?;

        let mut total = 0usize;
        for hole in listing.values().flatten() {
            hole.validate()?;
            total += 1;
        }

        Logger::event(
            Event::HolesLoaded,
            &[
                ("path", &path.display().to_string()),
                ("fields", &listing.len().to_string()),
                ("holes", &total.to_string()),
            ],
        );

        Ok(Self {
            holes: RwLock::new(listing),
        })
    }

    /// Fields with at least one hole, sorted
    pub fn fields(&self) -> HoleResult<Vec<String>> {
        let holes = self
            .holes
            .read()
            .map_err(|_| HoleError::Source("hole listing lock poisoned".into()))?;
        let mut fields: Vec<String> = holes.keys().cloned().collect();
        fields.sort();
        Ok(fields)
    }
}

impl HoleSource for MemoryHoleSource {
    fn holes_for(&self, field: &str) -> HoleResult<IndexHoleSet> {
        let holes = self
            .holes
            .read()
            .map_err(|_| HoleError::Source("hole listing lock poisoned".into()))?;
        Ok(holes
            .get(field)
            .map(|listed| IndexHoleSet::from_holes(listed.iter().cloned()))
            .unwrap_or_default())
    }
}
