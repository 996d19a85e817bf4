//! # Domain Errors
//!
//! Error taxonomy for the ingestion loop and command processor. Per-block
//! and per-command errors are contained and logged where they occur; only
//! storage failures terminate the loop.

use thiserror::Error;

/// Engine error types.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Checkpoint/snapshot/dedup storage cannot be created or written.
    /// Fatal: the loop must not proceed with an unpersisted checkpoint.
    #[error("state storage unavailable: {message}")]
    StorageUnavailable {
        /// Underlying cause.
        message: String,
    },

    /// A block was still empty after exhausting the retry bound. The block
    /// is skipped and its number checkpointed anyway.
    #[error("block {number} unavailable after {attempts} attempts")]
    BlockUnavailable {
        /// Block number that could not be fetched.
        number: u64,
        /// Attempts made.
        attempts: u32,
    },

    /// The root post of a command's thread no longer exists. The command
    /// is abandoned, non-fatally.
    #[error("referenced post @{author}/{permlink} does not exist")]
    MissingReferencedPost {
        /// Referenced author.
        author: String,
        /// Referenced permlink.
        permlink: String,
    },

    /// A reply or vote was rejected by the broadcast endpoint.
    #[error("{action} rejected for {target}")]
    SubmissionRejected {
        /// Which action was rejected ("reply" or "vote").
        action: &'static str,
        /// `@author/permlink` of the target.
        target: String,
    },

    /// Transport-level failure talking to the ledger node or wallet.
    #[error("rpc error: {0}")]
    Rpc(String),
}

impl EngineError {
    /// Wrap an I/O-ish failure as a storage error.
    pub fn storage(message: impl std::fmt::Display) -> Self {
        EngineError::StorageUnavailable {
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_unavailable_display() {
        let err = EngineError::storage("permission denied");
        assert!(err.to_string().contains("permission denied"));
    }

    #[test]
    fn test_block_unavailable_display() {
        let err = EngineError::BlockUnavailable {
            number: 96,
            attempts: 4,
        };
        assert!(err.to_string().contains("96"));
        assert!(err.to_string().contains("4 attempts"));
    }

    #[test]
    fn test_missing_post_display() {
        let err = EngineError::MissingReferencedPost {
            author: "alice".to_string(),
            permlink: "gone".to_string(),
        };
        assert!(err.to_string().contains("@alice/gone"));
    }

    #[test]
    fn test_submission_rejected_display() {
        let err = EngineError::SubmissionRejected {
            action: "vote",
            target: "@alice/my-post".to_string(),
        };
        assert!(err.to_string().contains("vote rejected"));
    }
}
