//! # Domain Layer
//!
//! Core types for block ingestion and command dispatch.

pub mod command;
pub mod entities;
pub mod errors;

pub use command::{Command, CommandMatcher};
pub use entities::{Block, ChainSnapshot, CommentOp, DedupRecord, DedupTable, Operation, Post};
pub use errors::EngineError;
