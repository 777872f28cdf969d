//! Ledger write commands.

use serde_json::json;
use tracing::debug;

use castwire_types::ActionEnvelope;

use crate::commands::{ledger_error, parse_params};
use crate::rpc::RpcError;
use crate::DaemonState;

/// Submit a signed action envelope.
///
/// The envelope is verified and appended by the ledger writer; on
/// acceptance the entry is applied to the live materializer so reads on
/// this daemon observe it immediately.
pub async fn submit_action(
    state: &DaemonState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, RpcError> {
    let envelope: ActionEnvelope = parse_params(params)?;

    let entry = state.ledger.append(&envelope).map_err(ledger_error)?;

    state.feed.write().await.apply(&entry);
    debug!(seq = entry.seq, "applied accepted action to feed");

    Ok(json!({ "seq": entry.seq, "acceptedAt": entry.accepted_at }))
}
