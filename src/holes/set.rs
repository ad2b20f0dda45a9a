//! Sorted collection of index holes
//!
//! Holes are kept in [`IndexHole`] order, so a sweep can stop at the first
//! hole whose value range starts after the probe.

use std::io::Read;

use super::errors::HoleResult;
use super::hole::IndexHole;

/// Index holes for one field, kept sorted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexHoleSet {
    holes: Vec<IndexHole>,
}

impl IndexHoleSet {
    /// Empty set: the index covers everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a sorted set from holes in any order. Duplicates are dropped.
    pub fn from_holes(holes: impl IntoIterator<Item = IndexHole>) -> Self {
        let mut holes: Vec<IndexHole> = holes.into_iter().collect();
        holes.sort();
        holes.dedup();
        Self { holes }
    }

    /// Reads a JSON array of holes and validates each one
    pub fn from_json_reader<R: Read>(reader: R) -> HoleResult<Self> {
        let holes: Vec<IndexHole> = serde_json::from_reader(reader)?;
        for hole in &holes {
            hole.validate()?;
        }
        Ok(Self::from_holes(holes))
    }

    /// Holes in sort order
    pub fn holes(&self) -> &[IndexHole] {
        &self.holes
    }

    pub fn len(&self) -> usize {
        self.holes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexHole> {
        self.holes.iter()
    }

    /// Holes containing `value` whose dates intersect `[query_start, query_end]`
    pub fn holes_overlapping_value<'a>(
        &'a self,
        query_start: &'a str,
        query_end: &'a str,
        value: &'a str,
    ) -> impl Iterator<Item = &'a IndexHole> + 'a {
        self.holes
            .iter()
            .take_while(move |hole| !hole.after(value))
            .filter(move |hole| !hole.before(value))
            .filter(move |hole| hole.overlaps(query_start, query_end, value))
    }

    /// Holes intersecting `[lower, upper]` whose dates intersect `[query_start, query_end]`
    pub fn holes_overlapping_range<'a>(
        &'a self,
        query_start: &'a str,
        query_end: &'a str,
        lower: &'a str,
        upper: &'a str,
    ) -> impl Iterator<Item = &'a IndexHole> + 'a {
        self.holes
            .iter()
            .take_while(move |hole| !hole.after(upper))
            .filter(move |hole| !hole.before(lower))
            .filter(move |hole| hole.overlaps_range(query_start, query_end, lower, upper))
    }

    /// True if no hole affects an equality lookup of `value` over the dates
    pub fn index_usable_for_value(&self, query_start: &str, query_end: &str, value: &str) -> bool {
        self.holes_overlapping_value(query_start, query_end, value)
            .next()
            .is_none()
    }

    /// True if no hole affects a range lookup of `[lower, upper]` over the dates
    pub fn index_usable_for_range(
        &self,
        query_start: &str,
        query_end: &str,
        lower: &str,
        upper: &str,
    ) -> bool {
        self.holes_overlapping_range(query_start, query_end, lower, upper)
            .next()
            .is_none()
    }
}

impl FromIterator<IndexHole> for IndexHoleSet {
    fn from_iter<T: IntoIterator<Item = IndexHole>>(iter: T) -> Self {
        Self::from_holes(iter)
    }
}

impl<'a> IntoIterator for &'a IndexHoleSet {
    type Item = &'a IndexHole;
    type IntoIter = std::slice::Iter<'a, IndexHole>;

    fn into_iter(self) -> Self::IntoIter {
        self.holes.iter()
    }
}
