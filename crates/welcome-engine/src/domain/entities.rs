//! # Domain Entities
//!
//! Blocks, operations, resolved posts, and dedup records.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// One sequence-numbered block fetched from the ledger. Immutable once
/// fetched; the source chain is treated as final.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Block {
    /// Block number (the checkpoint sequence).
    pub number: u64,
    /// Number of transactions in the block. A block with zero transactions
    /// is a legitimate no-op.
    pub transaction_count: usize,
}

impl Block {
    /// Create a new block record.
    pub fn new(number: u64, transaction_count: usize) -> Self {
        Self {
            number,
            transaction_count,
        }
    }
}

/// A typed operation inside a block.
///
/// Closed enum: only comment operations are relevant to the bot, and
/// unknown operation tags are ignored by construction (the adapter simply
/// never builds them).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// A comment: either a root post or a reply.
    Comment(CommentOp),
}

/// A comment operation as it appears on-chain.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommentOp {
    /// Comment author.
    pub author: String,
    /// Comment permlink (resource identifier, unique per author).
    pub permlink: String,
    /// Author of the parent content; empty for a root post.
    pub parent_author: String,
    /// Permlink of the parent content.
    pub parent_permlink: String,
    /// Free-text body.
    pub body: String,
}

impl CommentOp {
    /// A root post has no parent author.
    pub fn is_root_post(&self) -> bool {
        self.parent_author.is_empty()
    }
}

/// A resolved piece of content, fetched by (author, permlink).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    /// Post author.
    pub author: String,
    /// Post permlink.
    pub permlink: String,
    /// Author of the parent content; empty for a root post.
    pub parent_author: String,
    /// Permlink of the parent content.
    pub parent_permlink: String,
    /// Post body.
    pub body: String,
}

impl Post {
    /// A root post has no parent author.
    pub fn is_root_post(&self) -> bool {
        self.parent_author.is_empty()
    }

    /// `@author/permlink` form used in log lines.
    pub fn full_link(&self) -> String {
        format!("@{}/{}", self.author, self.permlink)
    }
}

/// Dynamic chain properties captured right after a block is processed.
///
/// Persisted for diagnostics and resume fallback only; the checkpoint is
/// authoritative for resumption.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainSnapshot {
    /// Head block number at capture time.
    pub head_block_number: u64,
    /// Chain time at capture time.
    pub time: String,
}

impl ChainSnapshot {
    /// Snapshot at a given head with no chain time.
    pub fn at_head(head_block_number: u64) -> Self {
        Self {
            head_block_number,
            time: String::new(),
        }
    }
}

/// Logical dedup tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DedupTable {
    /// One welcome per author. Membership is tested by author alone.
    Welcome,
    /// One vote per (author, permlink).
    Upvote,
}

impl DedupTable {
    /// Stable table name used as the storage key prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            DedupTable::Welcome => "welcome",
            DedupTable::Upvote => "upvote",
        }
    }
}

/// A persisted "already handled" fact. Created once per qualifying command,
/// never mutated or deleted.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DedupRecord {
    /// Actor the side effect was performed for.
    pub author: String,
    /// Resource the side effect targeted.
    pub permlink: String,
    /// When the record was written.
    pub created_at: String,
}

impl DedupRecord {
    /// Create a record timestamped now.
    pub fn new(author: &str, permlink: &str) -> Self {
        Self {
            author: author.to_string(),
            permlink: permlink.to_string(),
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(parent_author: &str) -> CommentOp {
        CommentOp {
            author: "alice".to_string(),
            permlink: "my-post".to_string(),
            parent_author: parent_author.to_string(),
            parent_permlink: String::new(),
            body: "hello".to_string(),
        }
    }

    #[test]
    fn test_root_post_detection() {
        assert!(comment("").is_root_post());
        assert!(!comment("bob").is_root_post());
    }

    #[test]
    fn test_post_full_link() {
        let post = Post {
            author: "alice".to_string(),
            permlink: "my-post".to_string(),
            parent_author: String::new(),
            parent_permlink: String::new(),
            body: String::new(),
        };
        assert_eq!(post.full_link(), "@alice/my-post");
    }

    #[test]
    fn test_dedup_table_names() {
        assert_eq!(DedupTable::Welcome.as_str(), "welcome");
        assert_eq!(DedupTable::Upvote.as_str(), "upvote");
    }

    #[test]
    fn test_dedup_record_timestamped() {
        let record = DedupRecord::new("alice", "my-post");
        assert_eq!(record.author, "alice");
        assert!(!record.created_at.is_empty());
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let snapshot = ChainSnapshot {
            head_block_number: 42,
            time: "2026-01-01T00:00:00".to_string(),
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: ChainSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
