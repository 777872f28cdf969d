//! Accepted ledger entries.

use serde::{Deserialize, Serialize};

use crate::action::Action;

/// An accepted, durable entry in the append-only action log.
///
/// `seq` is strictly increasing, assigned only by the ledger writer, and
/// never reused. Entries are immutable once appended; corrections are
/// expressed as later actions, never as log mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub seq: i64,
    pub uid: i64,
    /// The parsed action, for consumers.
    pub action: Action,
    /// The exact canonical bytes that were signed. Kept verbatim so the
    /// entry's signature remains verifiable by a third party.
    #[serde(rename = "actionJSON")]
    pub action_json: String,
    #[serde(rename = "acceptedAt")]
    pub accepted_at: u64,
}
