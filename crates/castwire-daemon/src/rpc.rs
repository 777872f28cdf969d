//! JSON-RPC server over Unix socket.
//!
//! Listens on a Unix domain socket, accepts connections, and dispatches
//! JSON-RPC method calls to the appropriate command handlers. Framing is
//! line-delimited: one request per line, one response per line.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tracing::{debug, error, info, warn};

use crate::commands;
use crate::DaemonState;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Method name.
    pub method: String,
    /// Parameters.
    #[serde(default)]
    pub params: serde_json::Value,
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
pub struct RpcResponse {
    /// JSON-RPC version.
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Result or error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RpcError {
    /// Error code.
    pub code: i32,
    /// Error name.
    pub message: String,
    /// Optional structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcResponse {
    /// Create a success response.
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: serde_json::Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

impl RpcError {
    // Standard JSON-RPC errors

    /// Parse error (-32700).
    pub fn parse_error() -> Self {
        Self {
            code: -32700,
            message: "PARSE_ERROR".to_string(),
            data: None,
        }
    }

    /// Method not found (-32601).
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: "METHOD_NOT_FOUND".to_string(),
            data: Some(serde_json::json!({"method": method})),
        }
    }

    /// Invalid params (-32602).
    pub fn invalid_params(detail: &str) -> Self {
        Self {
            code: -32602,
            message: "INVALID_PARAMS".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    /// Internal error (-32603).
    pub fn internal_error(detail: &str) -> Self {
        Self {
            code: -32603,
            message: "INTERNAL_ERROR".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    // Domain errors

    /// Unauthorized (-32010): no session and no share token covering the
    /// requested resource.
    pub fn unauthorized() -> Self {
        Self {
            code: -32010,
            message: "UNAUTHORIZED".to_string(),
            data: None,
        }
    }

    /// Unknown user (-32020).
    pub fn unknown_user(uid: i64) -> Self {
        Self {
            code: -32020,
            message: "UNKNOWN_USER".to_string(),
            data: Some(serde_json::json!({"uid": uid})),
        }
    }

    /// Key mismatch (-32021): envelope key is not the registered key.
    pub fn key_mismatch(uid: i64) -> Self {
        Self {
            code: -32021,
            message: "KEY_MISMATCH".to_string(),
            data: Some(serde_json::json!({"uid": uid})),
        }
    }

    /// Invalid signature (-32022).
    pub fn invalid_signature() -> Self {
        Self {
            code: -32022,
            message: "INVALID_SIGNATURE".to_string(),
            data: None,
        }
    }

    /// Malformed action (-32023).
    pub fn malformed_action(detail: &str) -> Self {
        Self {
            code: -32023,
            message: "MALFORMED_ACTION".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    /// Not found (-32030).
    pub fn not_found() -> Self {
        Self {
            code: -32030,
            message: "NOT_FOUND".to_string(),
            data: None,
        }
    }

    /// Corrupt thread (-32031). Carries the longest valid ancestor prefix
    /// so the client can still render it.
    pub fn corrupt_thread(post_id: i64, partial: serde_json::Value) -> Self {
        Self {
            code: -32031,
            message: "CORRUPT_THREAD".to_string(),
            data: Some(serde_json::json!({"postID": post_id, "partial": partial})),
        }
    }
}

/// The RPC server.
pub struct RpcServer {
    state: Arc<DaemonState>,
    socket_path: PathBuf,
}

impl RpcServer {
    /// Create a new RPC server.
    pub fn new(state: Arc<DaemonState>, socket_path: PathBuf) -> Self {
        Self { state, socket_path }
    }

    /// Run the server, accepting connections.
    pub async fn run(&self) -> anyhow::Result<()> {
        // Remove stale socket file
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)?;
        info!("IPC server listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let state = self.state.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(state, stream).await {
                            warn!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single client connection.
async fn handle_connection(
    state: Arc<DaemonState>,
    stream: tokio::net::UnixStream,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            break; // EOF
        }

        let response = match serde_json::from_str::<RpcRequest>(&line) {
            Ok(request) => dispatch_request(state.clone(), request).await,
            Err(_) => RpcResponse::error(serde_json::Value::Null, RpcError::parse_error()),
        };

        let mut response_json = serde_json::to_string(&response)?;
        response_json.push('\n');
        writer.write_all(response_json.as_bytes()).await?;
        writer.flush().await?;
    }

    Ok(())
}

/// Dispatch a JSON-RPC request to the appropriate command handler.
///
/// There is no connection-level authentication: each method resolves its
/// own caller from the session or share token it carries, so a single
/// connection can serve both authenticated and anonymous requests.
async fn dispatch_request(state: Arc<DaemonState>, request: RpcRequest) -> RpcResponse {
    let id = request.id.clone();
    let method = request.method.as_str();

    debug!("Dispatching RPC method: {}", method);

    let result = match method {
        // Account commands
        "register_user" => commands::accounts::register_user(&state, &request.params).await,
        "whoami" => commands::accounts::whoami(&state, &request.params).await,
        "logout" => commands::accounts::logout(&state, &request.params).await,

        // Ledger writes
        "submit_action" => commands::actions::submit_action(&state, &request.params).await,

        // Feed reads
        "load_post" => commands::feed::load_post(&state, &request.params).await,
        "load_thread" => commands::feed::load_thread(&state, &request.params).await,
        "home_feed" => commands::feed::home_feed(&state, &request.params).await,
        "profile_feed" => commands::feed::profile_feed(&state, &request.params).await,
        "issue_share_token" => commands::feed::issue_share_token(&state, &request.params).await,

        _ => Err(RpcError::method_not_found(method)),
    };

    match result {
        Ok(value) => RpcResponse::success(id, value),
        Err(err) => RpcResponse::error(id, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_error_codes() {
        let err = RpcError::unauthorized();
        assert_eq!(err.code, -32010);
        assert_eq!(err.message, "UNAUTHORIZED");

        let err = RpcError::key_mismatch(7);
        assert_eq!(err.code, -32021);

        let err = RpcError::corrupt_thread(3, serde_json::json!({"posts": []}));
        assert_eq!(err.code, -32031);

        let err = RpcError::method_not_found("unknown");
        assert_eq!(err.code, -32601);
    }

    #[test]
    fn test_rpc_response_success() {
        let resp = RpcResponse::success(serde_json::json!(1), serde_json::json!({"seq": 4}));
        assert!(resp.result.is_some());
        assert!(resp.error.is_none());
    }

    #[test]
    fn test_rpc_response_error() {
        let resp = RpcResponse::error(serde_json::json!(1), RpcError::internal_error("test"));
        assert!(resp.result.is_none());
        assert!(resp.error.is_some());
    }
}
