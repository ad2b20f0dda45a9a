//! In-memory scan store

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use super::errors::{ExecutorError, ExecutorResult};
use super::query::{Authorizations, Entry, Key, KeyRange};
use super::traits::{ScanCursor, ScanStore};

/// Tables of sorted key/value pairs held in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, BTreeMap<Key, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates `table` if missing
    pub fn create_table(&self, table: &str) -> ExecutorResult<()> {
        self.write()?.entry(table.to_string()).or_default();
        Ok(())
    }

    /// Writes one entry, creating the table if needed
    pub fn insert(&self, table: &str, key: Key, value: impl Into<String>) -> ExecutorResult<()> {
        self.write()?
            .entry(table.to_string())
            .or_default()
            .insert(key, value.into());
        Ok(())
    }

    /// Number of entries in `table`, 0 if it does not exist
    pub fn len(&self, table: &str) -> ExecutorResult<usize> {
        Ok(self.read()?.get(table).map_or(0, BTreeMap::len))
    }

    fn read(
        &self,
    ) -> ExecutorResult<std::sync::RwLockReadGuard<'_, HashMap<String, BTreeMap<Key, String>>>>
    {
        self.tables
            .read()
            .map_err(|_| ExecutorError::store_failed("store lock poisoned"))
    }

    fn write(
        &self,
    ) -> ExecutorResult<std::sync::RwLockWriteGuard<'_, HashMap<String, BTreeMap<Key, String>>>>
    {
        self.tables
            .write()
            .map_err(|_| ExecutorError::store_failed("store lock poisoned"))
    }
}

impl ScanStore for MemoryStore {
    fn open_scan(
        &self,
        table: &str,
        authorizations: &Authorizations,
        ranges: &[KeyRange],
    ) -> ExecutorResult<ScanCursor> {
        let tables = self.read()?;
        let rows = tables
            .get(table)
            .ok_or_else(|| ExecutorError::store_failed(format!("table '{}' does not exist", table)))?;

        // Overlapping ranges yield each entry once, in key order
        let entries: Vec<ExecutorResult<Entry>> = rows
            .iter()
            .filter(|(key, _)| ranges.iter().any(|r| r.contains(&key.row)))
            .filter(|(key, _)| authorizations.can_see(&key.visibility))
            .map(|(key, value)| Ok(Entry::new(key.clone(), value.clone())))
            .collect();

        Ok(Box::new(entries.into_iter()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert("shard", Key::new("r1", "a"), "1").unwrap();
        store.insert("shard", Key::new("r2", "a"), "2").unwrap();
        store
            .insert("shard", Key::new("r2", "b").with_visibility("SECRET"), "3")
            .unwrap();
        store.insert("shard", Key::new("r3", "a"), "4").unwrap();
        store
    }

    fn values(cursor: ScanCursor) -> Vec<String> {
        cursor.map(|e| e.unwrap().value).collect()
    }

    #[test]
    fn test_scan_ranges_in_key_order() {
        let store = store();
        let cursor = store
            .open_scan(
                "shard",
                &Authorizations::default(),
                &[KeyRange::row("r3"), KeyRange::row("r1")],
            )
            .unwrap();
        assert_eq!(values(cursor), vec!["1", "4"]);
    }

    #[test]
    fn test_overlapping_ranges_deduplicated() {
        let store = store();
        let cursor = store
            .open_scan(
                "shard",
                &Authorizations::default(),
                &[KeyRange::new("r1", "r3"), KeyRange::row("r2")],
            )
            .unwrap();
        assert_eq!(values(cursor), vec!["1", "2"]);
    }

    #[test]
    fn test_visibility_filtering() {
        let store = store();
        let cursor = store
            .open_scan("shard", &Authorizations::new(["SECRET"]), &[KeyRange::row("r2")])
            .unwrap();
        assert_eq!(values(cursor), vec!["2", "3"]);
    }

    #[test]
    fn test_missing_table() {
        let store = store();
        let err = store
            .open_scan("nope", &Authorizations::default(), &[KeyRange::all()])
            .err()
            .unwrap();
        assert_eq!(err.code().code(), "SHARD_STORE_FAILED");
        assert_eq!(store.len("nope").unwrap(), 0);
        assert_eq!(store.len("shard").unwrap(), 4);
    }
}
