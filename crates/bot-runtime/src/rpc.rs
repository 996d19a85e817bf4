//! # RPC Adapters
//!
//! `CondenserRpc` implements the read-only [`LedgerClient`] port against a
//! chain node's condenser API. `WalletRpc` implements the [`ActionClient`]
//! port against a local signing wallet (the wallet holds the posting key;
//! credential material never passes through this process).

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::warn;
use welcome_engine::{
    ActionClient, Block, ChainSnapshot, CommentOp, EngineError, LedgerClient, Operation, Post,
};

/// One JSON-RPC 2.0 call. A JSON-RPC `error` member becomes
/// `EngineError::Rpc`; transport failures do too.
async fn call(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: Value,
) -> Result<Value, EngineError> {
    let payload = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": method,
        "params": params,
    });
    let response = client
        .post(url)
        .json(&payload)
        .send()
        .await
        .map_err(|e| EngineError::Rpc(e.to_string()))?;
    let body: Value = response
        .json()
        .await
        .map_err(|e| EngineError::Rpc(e.to_string()))?;
    if let Some(error) = body.get("error") {
        return Err(EngineError::Rpc(format!("{method}: {error}")));
    }
    Ok(body.get("result").cloned().unwrap_or(Value::Null))
}

fn str_field(value: &Value, field: &str) -> String {
    value
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Parse `get_dynamic_global_properties` output.
fn parse_snapshot(value: &Value) -> Result<ChainSnapshot, EngineError> {
    let head_block_number = value
        .get("head_block_number")
        .and_then(Value::as_u64)
        .ok_or_else(|| EngineError::Rpc("properties missing head_block_number".to_string()))?;
    Ok(ChainSnapshot {
        head_block_number,
        time: str_field(value, "time"),
    })
}

/// Parse `get_ops_in_block` output, keeping only comment operations.
/// Each item is `{"op": [<type>, <data>], ...}`.
fn parse_operations(value: &Value) -> Vec<Operation> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let op = item.get("op")?;
            if op.get(0)?.as_str()? != "comment" {
                return None;
            }
            let data = op.get(1)?;
            Some(Operation::Comment(CommentOp {
                author: str_field(data, "author"),
                permlink: str_field(data, "permlink"),
                parent_author: str_field(data, "parent_author"),
                parent_permlink: str_field(data, "parent_permlink"),
                body: str_field(data, "body"),
            }))
        })
        .collect()
}

/// Parse `get_content` output. The node answers a missing permlink with an
/// empty record (author "") rather than an error.
fn parse_content(value: &Value) -> Option<Post> {
    let author = str_field(value, "author");
    if author.is_empty() {
        return None;
    }
    Some(Post {
        author,
        permlink: str_field(value, "permlink"),
        parent_author: str_field(value, "parent_author"),
        parent_permlink: str_field(value, "parent_permlink"),
        body: str_field(value, "body"),
    })
}

/// The thread root referenced by a content record.
fn root_reference(value: &Value) -> Option<(String, String)> {
    let root_author = str_field(value, "root_author");
    if root_author.is_empty() {
        return None;
    }
    Some((root_author, str_field(value, "root_permlink")))
}

/// Read-only ledger access over a node's condenser API.
pub struct CondenserRpc {
    client: reqwest::Client,
    url: String,
}

impl CondenserRpc {
    /// Connect to a node endpoint.
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }

    async fn get_content(&self, author: &str, permlink: &str) -> Result<Value, EngineError> {
        call(
            &self.client,
            &self.url,
            "condenser_api.get_content",
            json!([author, permlink]),
        )
        .await
    }
}

#[async_trait]
impl LedgerClient for CondenserRpc {
    async fn properties(&self) -> Result<ChainSnapshot, EngineError> {
        let result = call(
            &self.client,
            &self.url,
            "condenser_api.get_dynamic_global_properties",
            json!([]),
        )
        .await?;
        parse_snapshot(&result)
    }

    async fn block_interval_secs(&self) -> Result<u64, EngineError> {
        let result = call(
            &self.client,
            &self.url,
            "condenser_api.get_config",
            json!([]),
        )
        .await?;
        result
            .get("STEEM_BLOCK_INTERVAL")
            .or_else(|| result.get("STEEMIT_BLOCK_INTERVAL"))
            .and_then(Value::as_u64)
            .ok_or_else(|| EngineError::Rpc("chain config missing block interval".to_string()))
    }

    async fn fetch_block(&self, number: u64) -> Result<Option<Block>, EngineError> {
        let result = call(
            &self.client,
            &self.url,
            "condenser_api.get_block",
            json!([number]),
        )
        .await?;
        if result.is_null() {
            return Ok(None);
        }
        let transaction_count = result
            .get("transactions")
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        Ok(Some(Block::new(number, transaction_count)))
    }

    async fn fetch_operations(&self, number: u64) -> Result<Vec<Operation>, EngineError> {
        let result = call(
            &self.client,
            &self.url,
            "condenser_api.get_ops_in_block",
            json!([number, false]),
        )
        .await?;
        Ok(parse_operations(&result))
    }

    async fn resolve_root(
        &self,
        author: &str,
        permlink: &str,
    ) -> Result<Option<Post>, EngineError> {
        let content = self.get_content(author, permlink).await?;
        let Some(post) = parse_content(&content) else {
            return Ok(None);
        };
        let Some((root_author, root_permlink)) = root_reference(&content) else {
            // No root reference: the comment is its own thread root.
            return Ok(Some(post));
        };
        if root_author == post.author && root_permlink == post.permlink {
            return Ok(Some(post));
        }
        let root = self.get_content(&root_author, &root_permlink).await?;
        Ok(parse_content(&root))
    }
}

/// Reply/vote broadcast via a signing wallet's JSON-RPC API.
pub struct WalletRpc {
    client: reqwest::Client,
    url: String,
}

impl WalletRpc {
    /// Connect to a wallet endpoint.
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }

    /// Permlink for a reply: derived from the parent, unique per second.
    fn reply_permlink(parent: &Post) -> String {
        format!("re-{}-{}", parent.permlink, chrono::Utc::now().timestamp())
    }
}

#[async_trait]
impl ActionClient for WalletRpc {
    async fn submit_reply(
        &self,
        parent: &Post,
        body: &str,
        as_account: &str,
    ) -> Result<bool, EngineError> {
        let permlink = Self::reply_permlink(parent);
        let result = call(
            &self.client,
            &self.url,
            "post_comment",
            json!([
                as_account,
                permlink,
                parent.author,
                parent.permlink,
                "",
                body,
                "{}",
                true
            ]),
        )
        .await;
        match result {
            Ok(_) => Ok(true),
            Err(e) => {
                warn!("[runtime] wallet rejected reply to {}: {e}", parent.full_link());
                Ok(false)
            }
        }
    }

    async fn submit_vote(
        &self,
        author: &str,
        permlink: &str,
        weight: i16,
        as_account: &str,
    ) -> Result<bool, EngineError> {
        let result = call(
            &self.client,
            &self.url,
            "vote",
            json!([as_account, author, permlink, weight, true]),
        )
        .await;
        match result {
            Ok(_) => Ok(true),
            Err(e) => {
                warn!("[runtime] wallet rejected vote on @{author}/{permlink}: {e}");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_snapshot() {
        let value = json!({
            "head_block_number": 100,
            "time": "2026-01-01T00:00:00",
            "current_witness": "someone"
        });
        let snapshot = parse_snapshot(&value).unwrap();
        assert_eq!(snapshot.head_block_number, 100);
        assert_eq!(snapshot.time, "2026-01-01T00:00:00");
    }

    #[test]
    fn test_parse_snapshot_missing_head_is_error() {
        assert!(parse_snapshot(&json!({})).is_err());
    }

    #[test]
    fn test_parse_operations_keeps_comments_only() {
        let value = json!([
            {"op": ["vote", {"voter": "x"}]},
            {"op": ["comment", {
                "author": "greeter",
                "permlink": "re-post",
                "parent_author": "newuser",
                "parent_permlink": "post",
                "body": "@bot !welcome"
            }]},
            {"op": ["transfer", {"from": "a", "to": "b"}]}
        ]);
        let operations = parse_operations(&value);
        assert_eq!(operations.len(), 1);
        let Operation::Comment(comment) = &operations[0];
        assert_eq!(comment.author, "greeter");
        assert_eq!(comment.parent_author, "newuser");
    }

    #[test]
    fn test_parse_operations_tolerates_garbage() {
        assert!(parse_operations(&json!(null)).is_empty());
        assert!(parse_operations(&json!([{"noop": true}])).is_empty());
    }

    #[test]
    fn test_parse_content_missing_post() {
        // Node answers missing permlinks with an empty record.
        assert!(parse_content(&json!({"author": "", "permlink": ""})).is_none());
    }

    #[test]
    fn test_parse_content_and_root_reference() {
        let value = json!({
            "author": "greeter",
            "permlink": "re-post",
            "parent_author": "newuser",
            "parent_permlink": "post",
            "body": "hi",
            "root_author": "newuser",
            "root_permlink": "post"
        });
        let post = parse_content(&value).unwrap();
        assert!(!post.is_root_post());
        assert_eq!(
            root_reference(&value),
            Some(("newuser".to_string(), "post".to_string()))
        );
    }

    #[test]
    fn test_reply_permlink_derives_from_parent() {
        let parent = Post {
            author: "newuser".to_string(),
            permlink: "my-first-post".to_string(),
            parent_author: String::new(),
            parent_permlink: String::new(),
            body: String::new(),
        };
        assert!(WalletRpc::reply_permlink(&parent).starts_with("re-my-first-post-"));
    }
}
