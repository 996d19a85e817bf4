//! # Ingestion Service
//!
//! The checkpointed block loop. Resumes from the durable checkpoint,
//! processes every block up to the chain head in strictly ascending order,
//! and paces itself by one block interval once caught up.
//!
//! State machine: `RESUMING -> CATCHING_UP -> IDLE_WAIT -> CATCHING_UP -> ...`

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::application::CommandProcessor;
use crate::config::EngineConfig;
use crate::domain::{Block, EngineError, Operation};
use crate::ports::{ActionClient, DedupLedger, LedgerClient, StateStore};

/// Sleep used when the ledger cannot report its block interval.
const FALLBACK_BLOCK_INTERVAL_SECS: u64 = 3;

/// Drives ingestion end-to-end on a single logical thread of control.
pub struct IngestionService<L, A, S, D> {
    config: EngineConfig,
    ledger: Arc<L>,
    state: Arc<S>,
    processor: CommandProcessor<L, A, D>,
}

impl<L, A, S, D> IngestionService<L, A, S, D>
where
    L: LedgerClient,
    A: ActionClient,
    S: StateStore,
    D: DedupLedger,
{
    /// Wire the service to its ports.
    pub fn new(
        config: EngineConfig,
        ledger: Arc<L>,
        actions: Arc<A>,
        state: Arc<S>,
        dedup: Arc<D>,
    ) -> Self {
        let processor =
            CommandProcessor::new(config.clone(), Arc::clone(&ledger), actions, dedup);
        Self {
            config,
            ledger,
            state,
            processor,
        }
    }

    /// Run forever: catch up to the head, then sleep one block interval and
    /// re-check. Only a storage failure terminates the loop.
    pub async fn run(&self, start_from: Option<u64>) -> Result<(), EngineError> {
        let mut checkpoint = self.resume(start_from).await?;
        loop {
            checkpoint = self.catch_up(checkpoint).await?;

            let interval = match self.ledger.block_interval_secs().await {
                Ok(secs) => secs,
                Err(e) => {
                    warn!("[engine] could not read block interval: {e}");
                    FALLBACK_BLOCK_INTERVAL_SECS
                }
            };
            info!("[engine] caught up, sleeping for {interval} seconds");
            tokio::time::sleep(Duration::from_secs(interval)).await;
        }
    }

    /// One pass: resume, process everything up to the current head, and
    /// return the final checkpoint. Used by tests and dry runs.
    pub async fn run_once(&self, start_from: Option<u64>) -> Result<u64, EngineError> {
        let checkpoint = self.resume(start_from).await?;
        self.catch_up(checkpoint).await
    }

    /// RESUMING: determine where to start, seeding the durable state from
    /// the current head on a first-ever run.
    async fn resume(&self, start_from: Option<u64>) -> Result<u64, EngineError> {
        if let Some(block_num) = start_from {
            info!("[engine] starting from block {block_num} by request");
            return Ok(block_num);
        }

        let snapshot = self.ledger.properties().await?;
        let checkpoint = self.state.load_checkpoint(snapshot.head_block_number)?;
        self.state.load_snapshot(&snapshot)?;
        info!("[engine] last processed block: {checkpoint}");
        Ok(checkpoint)
    }

    /// CATCHING_UP: process blocks strictly ascending until the head is
    /// reached, persisting the checkpoint and a fresh snapshot after each.
    async fn catch_up(&self, mut checkpoint: u64) -> Result<u64, EngineError> {
        loop {
            let head = match self.ledger.current_head().await {
                Ok(head) => head,
                Err(e) => {
                    warn!("[engine] could not read chain head: {e}");
                    return Ok(checkpoint);
                }
            };
            if head <= checkpoint {
                return Ok(checkpoint);
            }

            checkpoint += 1;
            self.process_block(checkpoint).await?;
            self.state.save_checkpoint(checkpoint)?;

            match self.ledger.properties().await {
                Ok(snapshot) => self.state.save_snapshot(&snapshot)?,
                Err(e) => warn!("[engine] could not capture chain snapshot: {e}"),
            }
        }
    }

    /// Fetch one block (bounded retry) and dispatch its operations. All
    /// per-block and per-command failures are contained here.
    async fn process_block(&self, number: u64) -> Result<(), EngineError> {
        let block = match self.fetch_with_retry(number).await {
            Ok(block) => block,
            Err(e) => {
                // The block number is still checkpointed by the caller.
                error!("[engine] {e}, skipping");
                return Ok(());
            }
        };

        info!("[engine] processing block {number}");
        if block.transaction_count == 0 {
            return Ok(());
        }

        let operations = match self.ledger.fetch_operations(number).await {
            Ok(operations) => operations,
            Err(e) => {
                error!("[engine] could not list operations of block {number}: {e}");
                return Ok(());
            }
        };

        for operation in &operations {
            match operation {
                Operation::Comment(comment) => {
                    if let Err(e) = self.processor.process_comment(comment).await {
                        error!("[engine] command in block {number} failed: {e}");
                    }
                }
            }
        }
        Ok(())
    }

    /// Bounded fetch retry: `fetch_attempts` total tries, no backoff.
    async fn fetch_with_retry(&self, number: u64) -> Result<Block, EngineError> {
        let attempts = self.config.fetch_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.ledger.fetch_block(number).await {
                Ok(Some(block)) => return Ok(block),
                Ok(None) => {}
                Err(e) => warn!("[engine] fetch of block {number} failed: {e}"),
            }
            if attempt >= attempts {
                return Err(EngineError::BlockUnavailable { number, attempts: attempt });
            }
            info!("[engine] block {number} not available, retrying");
        }
    }
}
