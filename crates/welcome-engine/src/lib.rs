//! # Welcome Engine
//!
//! Block ingestion and command dispatch for the community welcome bot.
//!
//! The engine tails an append-only ledger one block at a time, looks for
//! comments that address the bot account with a `!welcome` command, and
//! reacts with idempotent side effects (a templated reply, a fixed-weight
//! upvote, and a durable dedup record). Progress is checkpointed after
//! every block so a restarted process resumes exactly where it left off.
//!
//! ## Module Structure
//!
//! ```text
//! welcome-engine/
//! ├── domain/          # Core types: Block, Operation, Post, errors
//! ├── ports/           # Outbound traits (ledger, actions, state, dedup)
//! ├── application/     # CommandProcessor + IngestionService
//! ├── adapters/        # File-backed and in-memory port implementations
//! └── config.rs        # EngineConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{FileDedupLedger, FileStateStore, MemoryDedupLedger, MemoryStateStore};
pub use application::{CommandProcessor, IngestionService};
pub use config::EngineConfig;
pub use domain::{
    Block, ChainSnapshot, Command, CommandMatcher, CommentOp, DedupRecord, DedupTable,
    EngineError, Operation, Post,
};
pub use ports::{
    ActionClient, DedupLedger, LedgerClient, MockActionClient, MockLedger, StateStore,
    SubmittedReply, SubmittedVote,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
