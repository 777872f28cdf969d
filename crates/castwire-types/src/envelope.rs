//! The transport envelope carrying an action's canonical bytes.

use serde::{Deserialize, Serialize};

/// A signed action in transit: the claimed signer, the exact canonical
/// serialization that was signed, and the signature over those bytes.
///
/// `action_json` must be verified byte-for-byte before it is parsed; a
/// re-serialization of the parsed value is not a valid verification input
/// (canonicalization-mismatch forgeries).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionEnvelope {
    /// The claimed author.
    pub uid: i64,
    /// The claimed author's public key, canonical lowercase hex.
    #[serde(rename = "pubKeyHex")]
    pub pub_key_hex: String,
    /// The exact canonical serialization of the action that was signed.
    #[serde(rename = "actionJSON")]
    pub action_json: String,
    /// Ed25519 signature over `action_json`, lowercase hex.
    #[serde(rename = "signature")]
    pub signature_hex: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_field_names() {
        let envelope = ActionEnvelope {
            uid: 7,
            pub_key_hex: "ab".repeat(32),
            action_json: r#"{"type":"post","content":"hello"}"#.to_string(),
            signature_hex: "cd".repeat(64),
        };
        let json = serde_json::to_value(&envelope).expect("serialize");
        assert!(json.get("pubKeyHex").is_some());
        assert!(json.get("actionJSON").is_some());
        assert!(json.get("signature").is_some());

        let back: ActionEnvelope = serde_json::from_value(json).expect("parse");
        assert_eq!(back, envelope);
    }
}
