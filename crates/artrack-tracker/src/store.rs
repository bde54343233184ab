//! Persistence seam.
//!
//! The coordinator only knows this narrow save/get/list/delete contract;
//! the storage medium (IndexedDB, files, a test map) lives behind it.

use std::collections::BTreeMap;

use artrack_core::StoredTarget;

use crate::error::StoreError;

/// Persistent key-value store for target records.
///
/// Implementations serialize however they like; [`MemoryStore`] keeps JSON
/// strings to exercise the same serialization path a real store would.
pub trait TargetStore {
    fn save(&mut self, record: &StoredTarget) -> Result<(), StoreError>;
    fn get(&self, id: &str) -> Result<Option<StoredTarget>, StoreError>;
    fn list_all(&self) -> Result<Vec<StoredTarget>, StoreError>;
    fn delete(&mut self, id: &str) -> Result<(), StoreError>;
    fn clear(&mut self) -> Result<(), StoreError>;
}

/// In-memory reference store. Default for tests and hosts without
/// persistence; records survive only as long as the value does.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl TargetStore for MemoryStore {
    fn save(&mut self, record: &StoredTarget) -> Result<(), StoreError> {
        let json = serde_json::to_string(record).map_err(|e| StoreError(e.to_string()))?;
        self.records.insert(record.id.clone(), json);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<StoredTarget>, StoreError> {
        self.records
            .get(id)
            .map(|json| serde_json::from_str(json).map_err(|e| StoreError(e.to_string())))
            .transpose()
    }

    fn list_all(&self) -> Result<Vec<StoredTarget>, StoreError> {
        self.records
            .values()
            .map(|json| serde_json::from_str(json).map_err(|e| StoreError(e.to_string())))
            .collect()
    }

    fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        self.records.remove(id);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.records.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> StoredTarget {
        StoredTarget {
            id: id.into(),
            name: format!("target {id}"),
            width: 64,
            height: 48,
            features: None,
            created_at_ms: 1,
        }
    }

    #[test]
    fn save_get_delete_round_trip() {
        let mut store = MemoryStore::new();
        store.save(&record("a")).unwrap();
        let got = store.get("a").unwrap().expect("record");
        assert_eq!(got.name, "target a");
        assert_eq!(got.width, 64);

        store.delete("a").unwrap();
        assert!(store.get("a").unwrap().is_none());
    }

    #[test]
    fn list_all_returns_every_record() {
        let mut store = MemoryStore::new();
        store.save(&record("a")).unwrap();
        store.save(&record("b")).unwrap();
        assert_eq!(store.list_all().unwrap().len(), 2);

        store.clear().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn save_overwrites_existing_record() {
        let mut store = MemoryStore::new();
        store.save(&record("a")).unwrap();
        let mut updated = record("a");
        updated.name = "renamed".into();
        store.save(&updated).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").unwrap().unwrap().name, "renamed");
    }
}
