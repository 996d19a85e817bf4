//! # Adapters
//!
//! Port implementations: file-backed stores for production, in-memory
//! stores for tests and dry runs.

pub mod dedup_file;
pub mod memory;
pub mod state_file;

pub use dedup_file::FileDedupLedger;
pub use memory::{MemoryDedupLedger, MemoryStateStore};
pub use state_file::FileStateStore;
