//! User identity records.

use serde::{Deserialize, Serialize};

/// An immutable identity anchor: one active signing key per uid at a time.
///
/// Created at registration; the uid is never reused. Key rotation is out of
/// scope — replacing a key means registering a new identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uid: i64,
    /// Currently registered public key, canonical lowercase hex.
    #[serde(rename = "pubKeyHex")]
    pub pub_key_hex: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(rename = "registeredAt")]
    pub registered_at: u64,
}
