//! Per-request snapshot of the `records` table.
//!
//! Each request loads every record into a [`MemoryStore`], runs the engine
//! against it, then commits only the keys whose version moved. The commit
//! re-checks the version each key was read at, so a concurrent request that
//! wrote the same key first turns this one into a `409`.

use std::collections::BTreeMap;

use creator_pass::storage::Record;
use creator_pass::MemoryStore;

/// A key written during the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub key: String,
    pub value: String,
    /// Version the request read; 0 when the key did not exist.
    pub read_version: u64,
    pub new_version: u64,
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    read_versions: BTreeMap<String, u64>,
    store: MemoryStore,
}

impl Snapshot {
    pub fn new(records: impl IntoIterator<Item = (String, Record)>) -> Self {
        let store = MemoryStore::from_records(records);
        let read_versions = store
            .records()
            .map(|(key, record)| (key.to_string(), record.version))
            .collect();
        Self {
            read_versions,
            store,
        }
    }

    pub fn store_mut(&mut self) -> &mut MemoryStore {
        &mut self.store
    }

    pub fn changes(&self) -> Vec<Change> {
        self.store
            .records()
            .filter_map(|(key, record)| {
                let read_version = self.read_versions.get(key).copied().unwrap_or(0);
                (record.version != read_version).then(|| Change {
                    key: key.to_string(),
                    value: record.value.clone(),
                    read_version,
                    new_version: record.version,
                })
            })
            .collect()
    }
}
