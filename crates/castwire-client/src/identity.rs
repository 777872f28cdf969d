//! Caller identity and envelope construction.

use castwire_crypto::ed25519::KeyPair;
use castwire_types::{Action, ActionEnvelope, User};

use crate::{ClientError, Result};

/// A loaded signing keypair plus its canonical hex public key.
pub struct Signer {
    keypair: KeyPair,
    pub_key_hex: String,
}

impl Signer {
    pub fn new(keypair: KeyPair) -> Self {
        let pub_key_hex = keypair.pub_key_hex();
        Self {
            keypair,
            pub_key_hex,
        }
    }

    /// Generate a fresh keypair (first-run registration).
    pub fn generate() -> Self {
        Self::new(KeyPair::generate())
    }

    pub fn pub_key_hex(&self) -> &str {
        &self.pub_key_hex
    }
}

/// Caller state: the submission protocol behaves differently for an
/// authenticated caller (sign and submit) versus an anonymous one
/// (short-circuit to the sign-in flow).
pub enum Identity {
    Authenticated { user: User, signer: Signer },
    Anonymous,
}

/// Result of preparing a submission.
pub enum SubmitOutcome {
    /// Envelope built and signed; ready for exactly one network submission.
    Ready(ActionEnvelope),
    /// Caller has no identity; route to sign-in and abort silently.
    LoginRequired,
}

/// Build and sign an envelope for `action`.
///
/// The action is serialized exactly once and those bytes are signed; the
/// envelope carries them verbatim. The server verifies over the same bytes,
/// so nothing may re-serialize in between.
pub fn prepare(identity: &Identity, action: &Action) -> Result<SubmitOutcome> {
    let (user, signer) = match identity {
        Identity::Authenticated { user, signer } => (user, signer),
        Identity::Anonymous => return Ok(SubmitOutcome::LoginRequired),
    };

    let action_json = action
        .to_canonical_json()
        .map_err(|e| ClientError::Serialization(e.to_string()))?;
    let signature = signer.keypair.signing_key.sign(action_json.as_bytes());

    tracing::debug!(uid = user.uid, "prepared signed action");

    Ok(SubmitOutcome::Ready(ActionEnvelope {
        uid: user.uid,
        pub_key_hex: signer.pub_key_hex.clone(),
        action_json,
        signature_hex: signature.to_hex(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use castwire_crypto::ed25519::{Signature, VerifyingKey};

    fn authenticated() -> Identity {
        let signer = Signer::generate();
        let user = User {
            uid: 7,
            pub_key_hex: signer.pub_key_hex().to_string(),
            display_name: "alice".to_string(),
            registered_at: 0,
        };
        Identity::Authenticated { user, signer }
    }

    #[test]
    fn test_prepare_signs_canonical_bytes() {
        let identity = authenticated();
        let action = Action::Post {
            content: "hello".to_string(),
            parent_id: None,
        };
        let envelope = match prepare(&identity, &action).expect("prepare") {
            SubmitOutcome::Ready(envelope) => envelope,
            SubmitOutcome::LoginRequired => panic!("authenticated caller"),
        };

        assert_eq!(envelope.uid, 7);
        assert_eq!(envelope.action_json, r#"{"type":"post","content":"hello"}"#);

        // A third party can verify from the envelope alone.
        let key = VerifyingKey::from_hex(&envelope.pub_key_hex).expect("key");
        let sig = Signature::from_hex(&envelope.signature_hex).expect("sig");
        assert!(key
            .verify(envelope.action_json.as_bytes(), &sig)
            .is_ok());
    }

    #[test]
    fn test_anonymous_short_circuits_silently() {
        let action = Action::Post {
            content: "hello".to_string(),
            parent_id: None,
        };
        match prepare(&Identity::Anonymous, &action).expect("no error surfaced") {
            SubmitOutcome::LoginRequired => {}
            SubmitOutcome::Ready(_) => panic!("anonymous caller must not sign"),
        }
    }
}
