//! # In-Memory Adapters
//!
//! Volatile state store and dedup ledger. Used by the application-layer
//! tests and useful for dry runs without touching disk.

use crate::domain::{ChainSnapshot, DedupRecord, DedupTable, EngineError};
use crate::ports::{DedupLedger, StateStore};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// In-memory [`StateStore`].
#[derive(Default)]
pub struct MemoryStateStore {
    checkpoint: Mutex<Option<u64>>,
    snapshot: Mutex<Option<ChainSnapshot>>,
}

impl MemoryStateStore {
    /// Store pre-seeded with a checkpoint, as if a previous run saved it.
    pub fn with_checkpoint(block_num: u64) -> Self {
        let store = Self::default();
        *store.checkpoint.lock().unwrap() = Some(block_num);
        store
    }

    /// Current checkpoint, if any was ever saved.
    pub fn checkpoint(&self) -> Option<u64> {
        *self.checkpoint.lock().unwrap()
    }

    /// Current snapshot, if any was ever saved.
    pub fn snapshot(&self) -> Option<ChainSnapshot> {
        self.snapshot.lock().unwrap().clone()
    }
}

impl StateStore for MemoryStateStore {
    fn load_checkpoint(&self, fallback: u64) -> Result<u64, EngineError> {
        let mut checkpoint = self.checkpoint.lock().unwrap();
        Ok(*checkpoint.get_or_insert(fallback))
    }

    fn save_checkpoint(&self, block_num: u64) -> Result<(), EngineError> {
        *self.checkpoint.lock().unwrap() = Some(block_num);
        Ok(())
    }

    fn load_snapshot(&self, fallback: &ChainSnapshot) -> Result<ChainSnapshot, EngineError> {
        let mut snapshot = self.snapshot.lock().unwrap();
        Ok(snapshot.get_or_insert_with(|| fallback.clone()).clone())
    }

    fn save_snapshot(&self, value: &ChainSnapshot) -> Result<(), EngineError> {
        *self.snapshot.lock().unwrap() = Some(value.clone());
        Ok(())
    }
}

/// In-memory [`DedupLedger`].
#[derive(Default)]
pub struct MemoryDedupLedger {
    entries: Mutex<BTreeMap<String, DedupRecord>>,
}

fn storage_key(table: DedupTable, author: &str, permlink: Option<&str>) -> String {
    match permlink {
        Some(permlink) => format!("{}/{}/{}", table.as_str(), author, permlink),
        None => format!("{}/{}", table.as_str(), author),
    }
}

impl MemoryDedupLedger {
    /// Number of records in one table.
    pub fn count(&self, table: DedupTable) -> usize {
        let prefix = format!("{}/", table.as_str());
        self.entries
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(&prefix))
            .count()
    }
}

impl DedupLedger for MemoryDedupLedger {
    fn has(
        &self,
        table: DedupTable,
        author: &str,
        permlink: Option<&str>,
    ) -> Result<bool, EngineError> {
        let entries = self.entries.lock().unwrap();
        Ok(entries.contains_key(&storage_key(table, author, permlink)))
    }

    fn record(&self, table: DedupTable, record: &DedupRecord) -> Result<(), EngineError> {
        let key = match table {
            DedupTable::Welcome => storage_key(table, &record.author, None),
            DedupTable::Upvote => {
                storage_key(table, &record.author, Some(record.permlink.as_str()))
            }
        };
        let mut entries = self.entries.lock().unwrap();
        entries.entry(key).or_insert_with(|| record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_store_seeds_once() {
        let store = MemoryStateStore::default();
        assert_eq!(store.load_checkpoint(95).unwrap(), 95);
        assert_eq!(store.load_checkpoint(10).unwrap(), 95);
    }

    #[test]
    fn test_state_store_save_then_load() {
        let store = MemoryStateStore::default();
        store.save_checkpoint(100).unwrap();
        assert_eq!(store.load_checkpoint(0).unwrap(), 100);
    }

    #[test]
    fn test_dedup_read_your_writes() {
        let ledger = MemoryDedupLedger::default();
        ledger
            .record(DedupTable::Upvote, &DedupRecord::new("alice", "my-post"))
            .unwrap();
        assert!(ledger
            .has(DedupTable::Upvote, "alice", Some("my-post"))
            .unwrap());
        assert_eq!(ledger.count(DedupTable::Upvote), 1);
        assert_eq!(ledger.count(DedupTable::Welcome), 0);
    }
}
