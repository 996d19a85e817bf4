//! # File State Store
//!
//! Checkpoint and chain snapshot persisted as two small files under the
//! bot's data directory: the checkpoint as a textual integer, the snapshot
//! as JSON. All writes go through a temp file, `sync_all`, and an atomic
//! rename so a restarted reader never observes a torn value.

use crate::domain::{ChainSnapshot, EngineError};
use crate::ports::StateStore;
use std::io::Write;
use std::path::{Path, PathBuf};

/// File-backed [`StateStore`].
pub struct FileStateStore {
    checkpoint_path: PathBuf,
    snapshot_path: PathBuf,
}

impl FileStateStore {
    /// Open a store rooted at `dir`, creating the directory if absent.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, EngineError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(EngineError::storage)?;
        Ok(Self {
            checkpoint_path: dir.join("checkpoint"),
            snapshot_path: dir.join("state"),
        })
    }

    fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), EngineError> {
        let temp_path = path.with_extension("tmp");
        let mut file = std::fs::File::create(&temp_path).map_err(EngineError::storage)?;
        file.write_all(bytes).map_err(EngineError::storage)?;
        file.sync_all().map_err(EngineError::storage)?;
        std::fs::rename(&temp_path, path).map_err(EngineError::storage)?;
        Ok(())
    }
}

impl StateStore for FileStateStore {
    fn load_checkpoint(&self, fallback: u64) -> Result<u64, EngineError> {
        match std::fs::read_to_string(&self.checkpoint_path) {
            Ok(text) => text.trim().parse().map_err(|e| {
                EngineError::storage(format!(
                    "corrupt checkpoint {}: {e}",
                    self.checkpoint_path.display()
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.save_checkpoint(fallback)?;
                Ok(fallback)
            }
            Err(e) => Err(EngineError::storage(e)),
        }
    }

    fn save_checkpoint(&self, block_num: u64) -> Result<(), EngineError> {
        Self::write_atomic(&self.checkpoint_path, block_num.to_string().as_bytes())
    }

    fn load_snapshot(&self, fallback: &ChainSnapshot) -> Result<ChainSnapshot, EngineError> {
        match std::fs::read_to_string(&self.snapshot_path) {
            Ok(text) => serde_json::from_str(&text).map_err(|e| {
                EngineError::storage(format!(
                    "corrupt snapshot {}: {e}",
                    self.snapshot_path.display()
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.save_snapshot(fallback)?;
                Ok(fallback.clone())
            }
            Err(e) => Err(EngineError::storage(e)),
        }
    }

    fn save_snapshot(&self, snapshot: &ChainSnapshot) -> Result<(), EngineError> {
        let json = serde_json::to_vec(snapshot).map_err(EngineError::storage)?;
        Self::write_atomic(&self.snapshot_path, &json)
    }
}
