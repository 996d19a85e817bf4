//! # Outbound Ports
//!
//! Traits for external dependencies: the read-only ledger node, the
//! action broadcast endpoint, the durable state store, and the dedup
//! ledger.

use crate::domain::{
    Block, ChainSnapshot, DedupRecord, DedupTable, EngineError, Operation, Post,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Read-only accessor for the source ledger - outbound port.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Current dynamic properties of the chain.
    async fn properties(&self) -> Result<ChainSnapshot, EngineError>;

    /// Nominal seconds between consecutive blocks.
    async fn block_interval_secs(&self) -> Result<u64, EngineError>;

    /// Fetch a block. `Ok(None)` means the block is not yet available.
    async fn fetch_block(&self, number: u64) -> Result<Option<Block>, EngineError>;

    /// Ordered operations contained in a block.
    async fn fetch_operations(&self, number: u64) -> Result<Vec<Operation>, EngineError>;

    /// Resolve the root post of the thread containing the given comment.
    /// `Ok(None)` means the referenced content no longer exists.
    async fn resolve_root(
        &self,
        author: &str,
        permlink: &str,
    ) -> Result<Option<Post>, EngineError>;

    /// Current head block number.
    async fn current_head(&self) -> Result<u64, EngineError> {
        Ok(self.properties().await?.head_block_number)
    }
}

/// Write accessor for replies and votes - outbound port.
///
/// `Ok(false)` is a rejection reported by the endpoint; `Err` is a
/// transport failure. Both are logged, neither terminates the loop.
#[async_trait]
pub trait ActionClient: Send + Sync {
    /// Post a reply under `parent` as `as_account`.
    async fn submit_reply(
        &self,
        parent: &Post,
        body: &str,
        as_account: &str,
    ) -> Result<bool, EngineError>;

    /// Cast a vote on `@author/permlink` as `as_account`.
    async fn submit_vote(
        &self,
        author: &str,
        permlink: &str,
        weight: i16,
        as_account: &str,
    ) -> Result<bool, EngineError>;
}

/// Durable checkpoint and snapshot persistence - outbound port.
///
/// On first-ever load the store initializes from the supplied fallback and
/// persists it before returning, so a repeated load is deterministic.
pub trait StateStore: Send + Sync {
    /// Load the last processed block number, seeding with `fallback` on
    /// first run.
    fn load_checkpoint(&self, fallback: u64) -> Result<u64, EngineError>;

    /// Durably record the last processed block number.
    fn save_checkpoint(&self, block_num: u64) -> Result<(), EngineError>;

    /// Load the last chain snapshot, seeding with `fallback` on first run.
    fn load_snapshot(&self, fallback: &ChainSnapshot) -> Result<ChainSnapshot, EngineError>;

    /// Durably record a chain snapshot.
    fn save_snapshot(&self, snapshot: &ChainSnapshot) -> Result<(), EngineError>;
}

/// Persistent "already handled" facts - outbound port.
///
/// Read-your-writes within a single process. No deletion.
pub trait DedupLedger: Send + Sync {
    /// Does a record exist? `Welcome` membership is tested by author alone
    /// (pass `None`); `Upvote` by (author, permlink).
    fn has(
        &self,
        table: DedupTable,
        author: &str,
        permlink: Option<&str>,
    ) -> Result<bool, EngineError>;

    /// Insert a record. Never overwrites semantics: a duplicate insert for
    /// the same key is a no-op.
    fn record(&self, table: DedupTable, record: &DedupRecord) -> Result<(), EngineError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

#[derive(Default)]
struct MockLedgerInner {
    head: u64,
    interval_secs: u64,
    operations: HashMap<u64, Vec<Operation>>,
    roots: HashMap<(String, String), Post>,
    unavailable: HashMap<u64, u32>,
    fetch_counts: HashMap<u64, u32>,
}

/// Scripted ledger for testing.
///
/// Every block up to the head exists; `fetch_operations` returns whatever
/// was inserted (default empty). `make_unavailable` scripts transient
/// fetch failures.
#[derive(Default)]
pub struct MockLedger {
    inner: Mutex<MockLedgerInner>,
}

impl MockLedger {
    /// Ledger with the given head and a 3-second block interval.
    pub fn new(head: u64) -> Self {
        let ledger = Self::default();
        {
            let mut inner = ledger.inner.lock().unwrap();
            inner.head = head;
            inner.interval_secs = 3;
        }
        ledger
    }

    /// Move the head forward (or back, for pathological tests).
    pub fn set_head(&self, head: u64) {
        self.inner.lock().unwrap().head = head;
    }

    /// Script the operations of one block.
    pub fn insert_operations(&self, number: u64, operations: Vec<Operation>) {
        self.inner.lock().unwrap().operations.insert(number, operations);
    }

    /// Map a comment (author, permlink) to its resolved thread root.
    pub fn map_root(&self, comment_author: &str, comment_permlink: &str, root: Post) {
        self.inner.lock().unwrap().roots.insert(
            (comment_author.to_string(), comment_permlink.to_string()),
            root,
        );
    }

    /// Make `fetch_block(number)` return `Ok(None)` for the next `times`
    /// calls.
    pub fn make_unavailable(&self, number: u64, times: u32) {
        self.inner.lock().unwrap().unavailable.insert(number, times);
    }

    /// How many times `fetch_block(number)` was called.
    pub fn fetch_count(&self, number: u64) -> u32 {
        self.inner
            .lock()
            .unwrap()
            .fetch_counts
            .get(&number)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn properties(&self) -> Result<ChainSnapshot, EngineError> {
        let inner = self.inner.lock().unwrap();
        Ok(ChainSnapshot {
            head_block_number: inner.head,
            time: "2026-01-01T00:00:00".to_string(),
        })
    }

    async fn block_interval_secs(&self) -> Result<u64, EngineError> {
        Ok(self.inner.lock().unwrap().interval_secs)
    }

    async fn fetch_block(&self, number: u64) -> Result<Option<Block>, EngineError> {
        let mut inner = self.inner.lock().unwrap();
        *inner.fetch_counts.entry(number).or_insert(0) += 1;

        if let Some(remaining) = inner.unavailable.get_mut(&number) {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(None);
            }
        }
        if number > inner.head {
            return Ok(None);
        }
        let tx_count = inner.operations.get(&number).map_or(0, Vec::len);
        Ok(Some(Block::new(number, tx_count)))
    }

    async fn fetch_operations(&self, number: u64) -> Result<Vec<Operation>, EngineError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .operations
            .get(&number)
            .cloned()
            .unwrap_or_default())
    }

    async fn resolve_root(
        &self,
        author: &str,
        permlink: &str,
    ) -> Result<Option<Post>, EngineError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .roots
            .get(&(author.to_string(), permlink.to_string()))
            .cloned())
    }
}

/// A reply captured by [`MockActionClient`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmittedReply {
    /// `@author/permlink` of the parent.
    pub parent: String,
    /// Reply body.
    pub body: String,
    /// Account the reply was posted as.
    pub account: String,
}

/// A vote captured by [`MockActionClient`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmittedVote {
    /// Voted author.
    pub author: String,
    /// Voted permlink.
    pub permlink: String,
    /// Vote weight.
    pub weight: i16,
    /// Account the vote was cast as.
    pub account: String,
}

#[derive(Default)]
struct MockActionInner {
    replies: Vec<SubmittedReply>,
    votes: Vec<SubmittedVote>,
    reject_replies: bool,
    reject_votes: bool,
}

/// Recording action client for testing.
#[derive(Default)]
pub struct MockActionClient {
    inner: Mutex<MockActionInner>,
}

impl MockActionClient {
    /// Make `submit_reply` report rejection.
    pub fn reject_replies(&self) {
        self.inner.lock().unwrap().reject_replies = true;
    }

    /// Make `submit_vote` report rejection.
    pub fn reject_votes(&self) {
        self.inner.lock().unwrap().reject_votes = true;
    }

    /// All replies submitted so far.
    pub fn replies(&self) -> Vec<SubmittedReply> {
        self.inner.lock().unwrap().replies.clone()
    }

    /// All votes submitted so far.
    pub fn votes(&self) -> Vec<SubmittedVote> {
        self.inner.lock().unwrap().votes.clone()
    }
}

#[async_trait]
impl ActionClient for MockActionClient {
    async fn submit_reply(
        &self,
        parent: &Post,
        body: &str,
        as_account: &str,
    ) -> Result<bool, EngineError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.reject_replies {
            return Ok(false);
        }
        inner.replies.push(SubmittedReply {
            parent: parent.full_link(),
            body: body.to_string(),
            account: as_account.to_string(),
        });
        Ok(true)
    }

    async fn submit_vote(
        &self,
        author: &str,
        permlink: &str,
        weight: i16,
        as_account: &str,
    ) -> Result<bool, EngineError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.reject_votes {
            return Ok(false);
        }
        inner.votes.push(SubmittedVote {
            author: author.to_string(),
            permlink: permlink.to_string(),
            weight,
            account: as_account.to_string(),
        });
        Ok(true)
    }
}
