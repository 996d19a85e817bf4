//! # Engine Configuration
//!
//! Configuration for the ingestion loop and command processor. Built once at
//! startup and passed in explicitly; the engine holds no ambient globals.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Total fetch attempts per block before the block is skipped.
pub const DEFAULT_FETCH_ATTEMPTS: u32 = 4;

/// Default upvote weight in percent.
pub const DEFAULT_VOTE_WEIGHT: i16 = 80;

/// Engine configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Account the bot posts and votes as. Commands must address this
    /// account (`@account !welcome`).
    pub account: String,

    /// Authors excluded from all command handling.
    pub blacklist: HashSet<String>,

    /// Reply body template. `$username` is replaced with the welcomed
    /// author's name.
    pub reply_template: String,

    /// Vote weight in percent (positive = upvote).
    pub vote_weight: i16,

    /// Total fetch attempts per block (first try included).
    pub fetch_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            account: "communitybot".to_string(),
            blacklist: HashSet::new(),
            reply_template: "Welcome to the community, $username!".to_string(),
            vote_weight: DEFAULT_VOTE_WEIGHT,
            fetch_attempts: DEFAULT_FETCH_ATTEMPTS,
        }
    }
}

impl EngineConfig {
    /// Create a config for testing.
    pub fn for_testing() -> Self {
        Self {
            account: "bot".to_string(),
            blacklist: HashSet::new(),
            reply_template: "Welcome aboard, $username!".to_string(),
            vote_weight: DEFAULT_VOTE_WEIGHT,
            fetch_attempts: DEFAULT_FETCH_ATTEMPTS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.fetch_attempts, 4);
        assert_eq!(config.vote_weight, 80);
        assert!(config.blacklist.is_empty());
    }

    #[test]
    fn test_testing_config() {
        let config = EngineConfig::for_testing();
        assert_eq!(config.account, "bot");
        assert!(config.reply_template.contains("$username"));
    }
}
