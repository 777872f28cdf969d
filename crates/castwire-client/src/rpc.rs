//! JSON-RPC client over the daemon's Unix socket.
//!
//! Line-delimited JSON-RPC 2.0, one request per line, matching the daemon's
//! framing. No retries and no batching: a failed submission is reported to
//! the caller, who decides whether to resubmit.

use std::path::Path;

use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

use castwire_types::{ActionEnvelope, FeedTab};

use crate::{ClientError, Result};

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: Value,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i32,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

/// A connected JSON-RPC client.
pub struct RpcClient {
    reader: BufReader<tokio::net::unix::OwnedReadHalf>,
    writer: tokio::net::unix::OwnedWriteHalf,
    next_id: u64,
}

impl RpcClient {
    /// Connect to the daemon socket.
    pub async fn connect(socket_path: &Path) -> Result<Self> {
        let stream = UnixStream::connect(socket_path).await?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            next_id: 1,
        })
    }

    /// Issue a single JSON-RPC call and wait for its response.
    pub async fn call(&mut self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id;
        self.next_id += 1;

        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        let mut line = serde_json::to_string(&request)
            .map_err(|e| ClientError::Serialization(e.to_string()))?;
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;

        let mut response_line = String::new();
        let bytes_read = self.reader.read_line(&mut response_line).await?;
        if bytes_read == 0 {
            return Err(ClientError::MalformedResponse(
                "connection closed by daemon".to_string(),
            ));
        }

        let response: RpcResponse = serde_json::from_str(&response_line)
            .map_err(|e| ClientError::MalformedResponse(e.to_string()))?;

        if let Some(error) = response.error {
            return Err(ClientError::Rpc {
                code: error.code,
                message: error.message,
                data: error.data,
            });
        }
        response
            .result
            .ok_or_else(|| ClientError::MalformedResponse("missing result".to_string()))
    }

    /// Register a new user, returning `{uid, sessionToken}`.
    pub async fn register(&mut self, pub_key_hex: &str, display_name: &str) -> Result<Value> {
        self.call(
            "register_user",
            json!({ "pubKeyHex": pub_key_hex, "displayName": display_name }),
        )
        .await
    }

    /// Submit a signed envelope. Exactly one network submission per call.
    pub async fn submit(&mut self, envelope: &ActionEnvelope) -> Result<Value> {
        let params = serde_json::to_value(envelope)
            .map_err(|e| ClientError::Serialization(e.to_string()))?;
        self.call("submit_action", params).await
    }

    /// Load a single post, authorized by session or share token.
    pub async fn load_post(
        &mut self,
        session_token: Option<&str>,
        share_token: Option<&str>,
        post_id: i64,
    ) -> Result<Value> {
        self.call(
            "load_post",
            json!({
                "sessionToken": session_token,
                "shareToken": share_token,
                "postID": post_id,
            }),
        )
        .await
    }

    /// Load the ancestor thread for a post.
    pub async fn load_thread(
        &mut self,
        session_token: Option<&str>,
        share_token: Option<&str>,
        post_id: i64,
    ) -> Result<Value> {
        self.call(
            "load_thread",
            json!({
                "sessionToken": session_token,
                "shareToken": share_token,
                "postID": post_id,
            }),
        )
        .await
    }

    /// Load the home feed (all visible posts, newest first).
    pub async fn home_feed(&mut self, session_token: &str) -> Result<Value> {
        self.call("home_feed", json!({ "sessionToken": session_token }))
            .await
    }

    /// Load a profile feed for a user.
    pub async fn profile_feed(
        &mut self,
        session_token: &str,
        profile_uid: i64,
        tab: FeedTab,
    ) -> Result<Value> {
        self.call(
            "profile_feed",
            json!({
                "sessionToken": session_token,
                "profileUid": profile_uid,
                "tab": tab,
            }),
        )
        .await
    }
}
