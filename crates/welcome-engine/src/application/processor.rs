//! # Command Processor
//!
//! Inspects one comment operation and performs the side effects of an
//! addressed command: a templated welcome reply, a fixed-weight upvote on
//! the thread's root post, and the dedup records that keep both exactly-once.

use std::sync::Arc;
use tracing::{error, info};

use crate::config::EngineConfig;
use crate::domain::{Command, CommandMatcher, CommentOp, DedupRecord, DedupTable, EngineError, Post};
use crate::ports::{ActionClient, DedupLedger, LedgerClient};

/// Decision function over one comment operation.
pub struct CommandProcessor<L, A, D> {
    config: EngineConfig,
    matcher: CommandMatcher,
    ledger: Arc<L>,
    actions: Arc<A>,
    dedup: Arc<D>,
}

impl<L, A, D> CommandProcessor<L, A, D>
where
    L: LedgerClient,
    A: ActionClient,
    D: DedupLedger,
{
    /// Create a processor bound to the given ports.
    pub fn new(config: EngineConfig, ledger: Arc<L>, actions: Arc<A>, dedup: Arc<D>) -> Self {
        let matcher = CommandMatcher::new(&config.account);
        Self {
            config,
            matcher,
            ledger,
            actions,
            dedup,
        }
    }

    /// Inspect one comment and act on an addressed command, if any.
    ///
    /// Commands ride on replies: a root post never carries one. A cheap
    /// mention test precedes the pattern match.
    pub async fn process_comment(&self, comment: &CommentOp) -> Result<(), EngineError> {
        if comment.is_root_post() {
            return Ok(());
        }
        if !self.matcher.mentions(&comment.body) {
            return Ok(());
        }
        if self.config.blacklist.contains(&comment.author) {
            info!(
                "[engine] author @{} is blacklisted, skipping {}",
                comment.author, comment.permlink
            );
            return Ok(());
        }
        match self.matcher.parse(&comment.body) {
            Some(Command::Welcome) => self.handle_welcome(comment).await,
            None => Ok(()),
        }
    }

    /// The `!welcome` command: reply to the thread's root post, upvote it,
    /// and record the author as welcomed.
    async fn handle_welcome(&self, comment: &CommentOp) -> Result<(), EngineError> {
        let root = match self
            .ledger
            .resolve_root(&comment.author, &comment.permlink)
            .await?
        {
            Some(post) => post,
            None => {
                info!(
                    "[engine] thread root of @{}/{} no longer exists, skipping",
                    comment.author, comment.permlink
                );
                return Ok(());
            }
        };

        if self.dedup.has(DedupTable::Welcome, &root.author, None)? {
            info!("[engine] @{} already welcomed, skipping", root.author);
            return Ok(());
        }

        let body = self.config.reply_template.replace("$username", &root.author);
        let delivered = self
            .actions
            .submit_reply(&root, &body, &self.config.account)
            .await?;
        if !delivered {
            error!("[engine] reply to {} was rejected", root.full_link());
        }

        // Observed source behavior, preserved: when the subject is not a
        // root post the flow stops after the reply, leaving no record, so
        // the same thread will be replied to again on a future command.
        if !root.is_root_post() {
            info!(
                "[engine] subject {} is not a root post, skipping vote and record",
                root.full_link()
            );
            return Ok(());
        }

        self.upvote(&root).await?;
        self.dedup
            .record(DedupTable::Welcome, &DedupRecord::new(&root.author, &root.permlink))?;
        info!("[engine] replied and upvoted @{}", root.author);
        Ok(())
    }

    /// Cast the fixed-weight vote unless one is already recorded. A
    /// rejected vote is logged and leaves no record, so a later command on
    /// the same thread gets another chance.
    async fn upvote(&self, post: &Post) -> Result<(), EngineError> {
        if self
            .dedup
            .has(DedupTable::Upvote, &post.author, Some(post.permlink.as_str()))?
        {
            info!("[engine] already voted on {}, skipping", post.full_link());
            return Ok(());
        }

        let accepted = self
            .actions
            .submit_vote(
                &post.author,
                &post.permlink,
                self.config.vote_weight,
                &self.config.account,
            )
            .await?;
        if !accepted {
            error!("[engine] failed voting on {}", post.full_link());
            return Ok(());
        }

        self.dedup
            .record(DedupTable::Upvote, &DedupRecord::new(&post.author, &post.permlink))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryDedupLedger;
    use crate::ports::{MockActionClient, MockLedger};

    struct Fixture {
        ledger: Arc<MockLedger>,
        actions: Arc<MockActionClient>,
        dedup: Arc<MemoryDedupLedger>,
        processor: CommandProcessor<MockLedger, MockActionClient, MemoryDedupLedger>,
    }

    fn fixture(config: EngineConfig) -> Fixture {
        let ledger = Arc::new(MockLedger::new(100));
        let actions = Arc::new(MockActionClient::default());
        let dedup = Arc::new(MemoryDedupLedger::default());
        let processor = CommandProcessor::new(
            config,
            Arc::clone(&ledger),
            Arc::clone(&actions),
            Arc::clone(&dedup),
        );
        Fixture {
            ledger,
            actions,
            dedup,
            processor,
        }
    }

    fn root_post() -> Post {
        Post {
            author: "newuser".to_string(),
            permlink: "my-first-post".to_string(),
            parent_author: String::new(),
            parent_permlink: String::new(),
            body: "hello world".to_string(),
        }
    }

    fn command_comment() -> CommentOp {
        CommentOp {
            author: "greeter".to_string(),
            permlink: "re-my-first-post".to_string(),
            parent_author: "newuser".to_string(),
            parent_permlink: "my-first-post".to_string(),
            body: "hey @bot !welcome this person".to_string(),
        }
    }

    #[tokio::test]
    async fn test_welcome_happy_path() {
        let fx = fixture(EngineConfig::for_testing());
        fx.ledger
            .map_root("greeter", "re-my-first-post", root_post());

        fx.processor.process_comment(&command_comment()).await.unwrap();

        let replies = fx.actions.replies();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].parent, "@newuser/my-first-post");
        assert_eq!(replies[0].body, "Welcome aboard, newuser!");
        assert_eq!(replies[0].account, "bot");

        let votes = fx.actions.votes();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].weight, 80);

        assert!(fx.dedup.has(DedupTable::Welcome, "newuser", None).unwrap());
        assert!(fx
            .dedup
            .has(DedupTable::Upvote, "newuser", Some("my-first-post"))
            .unwrap());
    }

    #[tokio::test]
    async fn test_blacklisted_author_no_side_effects() {
        let mut config = EngineConfig::for_testing();
        config.blacklist.insert("greeter".to_string());
        let fx = fixture(config);
        fx.ledger
            .map_root("greeter", "re-my-first-post", root_post());

        fx.processor.process_comment(&command_comment()).await.unwrap();

        assert!(fx.actions.replies().is_empty());
        assert!(fx.actions.votes().is_empty());
        assert_eq!(fx.dedup.count(DedupTable::Welcome), 0);
        assert_eq!(fx.dedup.count(DedupTable::Upvote), 0);
    }

    #[tokio::test]
    async fn test_root_post_comment_is_ignored() {
        let fx = fixture(EngineConfig::for_testing());

        let mut comment = command_comment();
        comment.parent_author = String::new();
        fx.processor.process_comment(&comment).await.unwrap();

        assert!(fx.actions.replies().is_empty());
    }

    #[tokio::test]
    async fn test_body_without_command_is_ignored() {
        let fx = fixture(EngineConfig::for_testing());
        fx.ledger
            .map_root("greeter", "re-my-first-post", root_post());

        let mut comment = command_comment();
        comment.body = "@bot welcome".to_string();
        fx.processor.process_comment(&comment).await.unwrap();

        assert!(fx.actions.replies().is_empty());
        assert!(fx.actions.votes().is_empty());
    }

    #[tokio::test]
    async fn test_missing_root_is_nonfatal() {
        let fx = fixture(EngineConfig::for_testing());
        // No root mapped: resolution returns None.
        fx.processor.process_comment(&command_comment()).await.unwrap();

        assert!(fx.actions.replies().is_empty());
        assert_eq!(fx.dedup.count(DedupTable::Welcome), 0);
    }

    #[tokio::test]
    async fn test_already_welcomed_is_idempotent() {
        let fx = fixture(EngineConfig::for_testing());
        fx.ledger
            .map_root("greeter", "re-my-first-post", root_post());
        fx.dedup
            .record(DedupTable::Welcome, &DedupRecord::new("newuser", "my-first-post"))
            .unwrap();

        fx.processor.process_comment(&command_comment()).await.unwrap();

        assert!(fx.actions.replies().is_empty());
        assert!(fx.actions.votes().is_empty());
    }

    #[tokio::test]
    async fn test_double_processing_sends_one_reply() {
        let fx = fixture(EngineConfig::for_testing());
        fx.ledger
            .map_root("greeter", "re-my-first-post", root_post());

        fx.processor.process_comment(&command_comment()).await.unwrap();
        fx.processor.process_comment(&command_comment()).await.unwrap();

        assert_eq!(fx.actions.replies().len(), 1);
        assert_eq!(fx.actions.votes().len(), 1);
    }

    #[tokio::test]
    async fn test_non_root_subject_replies_without_vote_or_record() {
        let fx = fixture(EngineConfig::for_testing());
        let mut subject = root_post();
        subject.parent_author = "someone".to_string();
        subject.parent_permlink = "earlier-post".to_string();
        fx.ledger.map_root("greeter", "re-my-first-post", subject);

        fx.processor.process_comment(&command_comment()).await.unwrap();

        assert_eq!(fx.actions.replies().len(), 1);
        assert!(fx.actions.votes().is_empty());
        assert_eq!(fx.dedup.count(DedupTable::Welcome), 0);
        assert_eq!(fx.dedup.count(DedupTable::Upvote), 0);
    }

    #[tokio::test]
    async fn test_rejected_vote_leaves_no_upvote_record() {
        let fx = fixture(EngineConfig::for_testing());
        fx.ledger
            .map_root("greeter", "re-my-first-post", root_post());
        fx.actions.reject_votes();

        fx.processor.process_comment(&command_comment()).await.unwrap();

        // The welcome still completes; only the vote is left retryable.
        assert_eq!(fx.actions.replies().len(), 1);
        assert!(fx.dedup.has(DedupTable::Welcome, "newuser", None).unwrap());
        assert_eq!(fx.dedup.count(DedupTable::Upvote), 0);
    }

    #[tokio::test]
    async fn test_prior_vote_is_skipped_but_welcome_proceeds() {
        let fx = fixture(EngineConfig::for_testing());
        fx.ledger
            .map_root("greeter", "re-my-first-post", root_post());
        fx.dedup
            .record(DedupTable::Upvote, &DedupRecord::new("newuser", "my-first-post"))
            .unwrap();

        fx.processor.process_comment(&command_comment()).await.unwrap();

        assert_eq!(fx.actions.replies().len(), 1);
        assert!(fx.actions.votes().is_empty());
        assert!(fx.dedup.has(DedupTable::Welcome, "newuser", None).unwrap());
    }

    #[tokio::test]
    async fn test_rejected_reply_still_completes_welcome() {
        let fx = fixture(EngineConfig::for_testing());
        fx.ledger
            .map_root("greeter", "re-my-first-post", root_post());
        fx.actions.reject_replies();

        fx.processor.process_comment(&command_comment()).await.unwrap();

        // Reply failure is logged but does not block the flow.
        assert_eq!(fx.actions.votes().len(), 1);
        assert!(fx.dedup.has(DedupTable::Welcome, "newuser", None).unwrap());
    }
}
