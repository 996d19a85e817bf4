//! # Ports
//!
//! Outbound traits for everything the engine depends on, plus mock
//! implementations used by the application-layer tests.

pub mod outbound;

pub use outbound::{
    ActionClient, DedupLedger, LedgerClient, MockActionClient, MockLedger, StateStore,
    SubmittedReply, SubmittedVote,
};
