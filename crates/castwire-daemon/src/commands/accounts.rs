//! Account commands: registration, identity lookup, logout.

use serde::Deserialize;
use serde_json::json;
use tracing::info;

use castwire_crypto::ed25519::VerifyingKey;
use castwire_db::{queries, DbError};
use castwire_types::{User, MAX_DISPLAY_NAME_LENGTH};

use crate::commands::{lock_conn, parse_params, session_user, unix_now};
use crate::rpc::RpcError;
use crate::DaemonState;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegisterUserParams {
    #[serde(rename = "pubKeyHex")]
    pub_key_hex: String,
    #[serde(rename = "displayName")]
    display_name: String,
}

/// Register a new user under a client-generated keypair and open a session.
pub async fn register_user(
    state: &DaemonState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, RpcError> {
    let params: RegisterUserParams = parse_params(params)?;

    // The stored key is the canonical form later compared byte-for-byte
    // against envelope keys, so reject anything non-canonical up front.
    VerifyingKey::from_hex(&params.pub_key_hex)
        .map_err(|_| RpcError::invalid_params("pubKeyHex is not a canonical ed25519 public key"))?;

    let display_name = params.display_name.trim();
    if display_name.is_empty() {
        return Err(RpcError::invalid_params("displayName must not be empty"));
    }
    if display_name.chars().count() > MAX_DISPLAY_NAME_LENGTH {
        return Err(RpcError::invalid_params("displayName too long"));
    }

    let registered_at = unix_now();
    let (user, session_token) = {
        let conn = lock_conn(state);
        let uid = match queries::users::insert(&conn, &params.pub_key_hex, display_name, registered_at)
        {
            Ok(uid) => uid,
            Err(DbError::Constraint(_)) => {
                return Err(RpcError::invalid_params("public key already registered"));
            }
            Err(e) => return Err(RpcError::internal_error(&e.to_string())),
        };
        let token = castwire_auth::session::create_session(&conn, uid, registered_at)
            .map_err(|e| RpcError::internal_error(&e.to_string()))?;
        (
            User {
                uid,
                pub_key_hex: params.pub_key_hex,
                display_name: display_name.to_string(),
                registered_at,
            },
            token,
        )
    };

    // Prime the user cache so the first post assembles without a rebuild.
    state.feed.write().await.upsert_user(user.clone());

    info!(uid = user.uid, "registered user");

    Ok(json!({ "user": user, "sessionToken": session_token }))
}

#[derive(Debug, Deserialize)]
struct WhoamiParams {
    #[serde(rename = "sessionToken", default)]
    session_token: Option<String>,
}

/// Resolve the caller's session to its user record, or null for anonymous.
pub async fn whoami(
    state: &DaemonState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, RpcError> {
    let params: WhoamiParams = parse_params(params)?;
    let user = session_user(state, params.session_token.as_deref())?;
    Ok(json!({ "user": user }))
}

#[derive(Debug, Deserialize)]
struct LogoutParams {
    #[serde(rename = "sessionToken")]
    session_token: String,
}

/// Revoke the caller's session. Unknown tokens are a silent no-op.
pub async fn logout(
    state: &DaemonState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, RpcError> {
    let params: LogoutParams = parse_params(params)?;
    let conn = lock_conn(state);
    castwire_auth::session::destroy_session(&conn, &params.session_token)
        .map_err(|e| RpcError::internal_error(&e.to_string()))?;
    Ok(json!({ "ok": true }))
}
