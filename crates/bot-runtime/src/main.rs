//! # Community Bot Runtime
//!
//! Wires the welcome engine to a chain node and a signing wallet, loads
//! configuration, and runs the ingestion loop until ctrl-c.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging
//! 2. Load configuration (JSON file argument + env overrides)
//! 3. Open the durable state store and dedup ledger (fatal on failure)
//! 4. Wire the RPC adapters
//! 5. Run the ingestion loop

mod config;
mod rpc;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use welcome_engine::{FileDedupLedger, FileStateStore, IngestionService, VERSION};

use crate::config::RuntimeConfig;
use crate::rpc::{CondenserRpc, WalletRpc};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("===========================================");
    info!("  Community Bot Runtime v{VERSION}");
    info!("===========================================");

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .context("usage: bot-runtime <config.json>")?;
    let config = RuntimeConfig::load(Path::new(&config_path))?;
    let engine_config = config.engine_config()?;
    info!("[runtime] acting as @{}", config.account);
    info!("[runtime] node: {}", config.node_url);
    info!("[runtime] data dir: {:?}", config.data_dir());

    // Durable storage: failure here is fatal, the loop must not run with
    // an unpersisted checkpoint.
    let data_dir = config.data_dir();
    let state = Arc::new(FileStateStore::open(&data_dir).context("opening state store")?);
    let dedup = Arc::new(
        FileDedupLedger::open(data_dir.join("dedup.json")).context("opening dedup ledger")?,
    );

    // External collaborators
    let ledger = Arc::new(CondenserRpc::new(config.node_url.clone()));
    let actions = Arc::new(WalletRpc::new(config.wallet_url.clone()));

    let service = IngestionService::new(engine_config, ledger, actions, state, dedup);

    info!("[runtime] starting ingestion loop");
    tokio::select! {
        result = service.run(config.start_from) => {
            result.context("ingestion loop failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("[runtime] shutdown signal received");
        }
    }
    Ok(())
}
