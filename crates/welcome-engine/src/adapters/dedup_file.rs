//! # File Dedup Ledger
//!
//! A single JSON map file holding both logical tables. Keys are
//! `welcome/<author>` and `upvote/<author>/<permlink>`; values are the full
//! records. The whole map is rewritten atomically on every insert, which is
//! fine at the bot's write rate (one record per welcomed author, ever).

use crate::domain::{DedupRecord, DedupTable, EngineError};
use crate::ports::DedupLedger;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// File-backed [`DedupLedger`].
pub struct FileDedupLedger {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, DedupRecord>>,
}

fn storage_key(table: DedupTable, author: &str, permlink: Option<&str>) -> String {
    match permlink {
        Some(permlink) => format!("{}/{}/{}", table.as_str(), author, permlink),
        None => format!("{}/{}", table.as_str(), author),
    }
}

impl FileDedupLedger {
    /// Open (or create) the ledger file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(EngineError::storage)?;
        }

        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).map_err(|e| {
                EngineError::storage(format!("corrupt dedup ledger {}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(EngineError::storage(e)),
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn save(&self, entries: &BTreeMap<String, DedupRecord>) -> Result<(), EngineError> {
        let json = serde_json::to_vec_pretty(entries).map_err(EngineError::storage)?;
        let temp_path = self.path.with_extension("tmp");
        let mut file = std::fs::File::create(&temp_path).map_err(EngineError::storage)?;
        file.write_all(&json).map_err(EngineError::storage)?;
        file.sync_all().map_err(EngineError::storage)?;
        std::fs::rename(&temp_path, &self.path).map_err(EngineError::storage)?;
        Ok(())
    }
}

impl DedupLedger for FileDedupLedger {
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
            // Welcome is keyed by author alone: one welcome per author.
            DedupTable::Welcome => storage_key(table, &record.author, None),
            DedupTable::Upvote => {
                storage_key(table, &record.author, Some(record.permlink.as_str()))
            }
        };

        let mut entries = self.entries.lock().unwrap();
        if entries.contains_key(&key) {
            return Ok(());
        }
        entries.insert(key, record.clone());
        self.save(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_your_writes() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FileDedupLedger::open(dir.path().join("dedup.json")).unwrap();

        assert!(!ledger.has(DedupTable::Welcome, "alice", None).unwrap());
        ledger
            .record(DedupTable::Welcome, &DedupRecord::new("alice", "my-post"))
            .unwrap();
        assert!(ledger.has(DedupTable::Welcome, "alice", None).unwrap());
    }

    #[test]
    fn test_welcome_keyed_by_author_only() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FileDedupLedger::open(dir.path().join("dedup.json")).unwrap();

        ledger
            .record(DedupTable::Welcome, &DedupRecord::new("alice", "first-post"))
            .unwrap();
        // A welcome for a different permlink of the same author still counts.
        assert!(ledger.has(DedupTable::Welcome, "alice", None).unwrap());
    }

    #[test]
    fn test_upvote_keyed_by_author_and_permlink() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FileDedupLedger::open(dir.path().join("dedup.json")).unwrap();

        ledger
            .record(DedupTable::Upvote, &DedupRecord::new("alice", "first-post"))
            .unwrap();
        assert!(ledger
            .has(DedupTable::Upvote, "alice", Some("first-post"))
            .unwrap());
        assert!(!ledger
            .has(DedupTable::Upvote, "alice", Some("second-post"))
            .unwrap());
    }

    #[test]
    fn test_tables_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FileDedupLedger::open(dir.path().join("dedup.json")).unwrap();

        ledger
            .record(DedupTable::Welcome, &DedupRecord::new("alice", "my-post"))
            .unwrap();
        assert!(!ledger
            .has(DedupTable::Upvote, "alice", Some("my-post"))
            .unwrap());
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dedup.json");
        {
            let ledger = FileDedupLedger::open(&path).unwrap();
            ledger
                .record(DedupTable::Welcome, &DedupRecord::new("alice", "my-post"))
                .unwrap();
        }
        let ledger = FileDedupLedger::open(&path).unwrap();
        assert!(ledger.has(DedupTable::Welcome, "alice", None).unwrap());
    }

    #[test]
    fn test_duplicate_insert_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FileDedupLedger::open(dir.path().join("dedup.json")).unwrap();

        let first = DedupRecord::new("alice", "my-post");
        ledger.record(DedupTable::Welcome, &first).unwrap();
        ledger
            .record(DedupTable::Welcome, &DedupRecord::new("alice", "other"))
            .unwrap();

        // The original record is kept untouched.
        let entries = ledger.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries.values().next().unwrap().permlink, "my-post");
    }
}
