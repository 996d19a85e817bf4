//! # Application Layer
//!
//! `CommandProcessor` decides what a single comment means; `IngestionService`
//! drives the checkpointed block loop that feeds it.

pub mod processor;
pub mod service;

pub use processor::CommandProcessor;
pub use service::IngestionService;
