//! RPC command handlers.

pub mod accounts;
pub mod actions;
pub mod feed;

use std::sync::MutexGuard;

use rusqlite::Connection;
use serde::de::DeserializeOwned;

use castwire_ledger::LedgerError;
use castwire_types::User;

use crate::rpc::RpcError;
use crate::DaemonState;

/// Viewer uid used for anonymous share-token access.
pub const ANONYMOUS_UID: i64 = -1;

/// Parse method params into a typed struct.
pub(crate) fn parse_params<T: DeserializeOwned>(params: &serde_json::Value) -> Result<T, RpcError> {
    serde_json::from_value(params.clone()).map_err(|e| RpcError::invalid_params(&e.to_string()))
}

/// Lock the shared database connection, recovering a poisoned lock.
pub(crate) fn lock_conn(state: &DaemonState) -> MutexGuard<'_, Connection> {
    match state.conn.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Resolve a session token to its user, or `None` for anonymous.
pub(crate) fn session_user(
    state: &DaemonState,
    token: Option<&str>,
) -> Result<Option<User>, RpcError> {
    let conn = lock_conn(state);
    castwire_auth::session::authenticate_request(&conn, token)
        .map_err(|e| RpcError::internal_error(&e.to_string()))
}

/// Map a rejected ledger append to its RPC error.
pub(crate) fn ledger_error(err: LedgerError) -> RpcError {
    match err {
        LedgerError::UnknownUser { uid } => RpcError::unknown_user(uid),
        LedgerError::KeyMismatch { uid } => RpcError::key_mismatch(uid),
        LedgerError::InvalidSignature => RpcError::invalid_signature(),
        LedgerError::MalformedAction(detail) => RpcError::malformed_action(&detail),
        LedgerError::Db(e) => RpcError::internal_error(&e.to_string()),
    }
}

/// Current wall-clock time as Unix seconds.
pub(crate) fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
