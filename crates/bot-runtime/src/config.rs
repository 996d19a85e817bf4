//! # Runtime Configuration
//!
//! JSON config file (the single CLI argument) plus environment overrides.
//! The file carries identities and endpoints; the reply template lives in
//! its own file so operators can edit it without touching the config.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;
use welcome_engine::EngineConfig;

fn default_vote_weight() -> i16 {
    welcome_engine::config::DEFAULT_VOTE_WEIGHT
}

/// Runtime configuration, deserialized from the JSON config file.
#[derive(Clone, Debug, Deserialize)]
pub struct RuntimeConfig {
    /// Account the bot acts as.
    pub account: String,
    /// JSON-RPC endpoint of a chain node (reads).
    pub node_url: String,
    /// JSON-RPC endpoint of the signing wallet (writes).
    pub wallet_url: String,
    /// Authors excluded from command handling.
    #[serde(default)]
    pub blacklisted_users: HashSet<String>,
    /// Path to the welcome reply template (`$username` placeholder).
    pub welcome_message: PathBuf,
    /// Data directory for checkpoint/state/dedup files.
    /// Defaults to `~/.communitybot`.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Vote weight in percent.
    #[serde(default = "default_vote_weight")]
    pub vote_weight: i16,
    /// Ignore the checkpoint and start from this block.
    #[serde(default)]
    pub start_from: Option<u64>,
}

impl RuntimeConfig {
    /// Load from a JSON file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let mut config: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("BOT_NODE_URL") {
            info!("[runtime] node url overridden from environment");
            self.node_url = url;
        }
        if let Ok(url) = std::env::var("BOT_WALLET_URL") {
            info!("[runtime] wallet url overridden from environment");
            self.wallet_url = url;
        }
        if let Ok(dir) = std::env::var("BOT_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }
    }

    /// Resolved data directory.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".communitybot")
        })
    }

    /// Build the engine config, reading the reply template file.
    pub fn engine_config(&self) -> Result<EngineConfig> {
        let reply_template = std::fs::read_to_string(&self.welcome_message)
            .with_context(|| {
                format!(
                    "reading welcome template {}",
                    self.welcome_message.display()
                )
            })?;
        Ok(EngineConfig {
            account: self.account.clone(),
            blacklist: self.blacklisted_users.clone(),
            reply_template,
            vote_weight: self.vote_weight,
            fetch_attempts: welcome_engine::config::DEFAULT_FETCH_ATTEMPTS,
        })
    }
}
