//! # castwire-ledger
//!
//! The ledger writer: the single serialization point of the system and the
//! security boundary for every state change.
//!
//! [`Ledger::append`] runs a fixed gauntlet of hard gates, each fail-fast
//! with no partial effects:
//!
//! 1. resolve the claimed uid ([`LedgerError::UnknownUser`])
//! 2. bind the envelope key to the registered key ([`LedgerError::KeyMismatch`])
//! 3. verify the signature over the exact envelope bytes
//!    ([`LedgerError::InvalidSignature`])
//! 4. parse and validate the action ([`LedgerError::MalformedAction`])
//! 5. assign the next seq atomically and persist
//!
//! Gates 1–4 are reads and pure computation; they run without the writer
//! lock and may proceed fully in parallel across submissions. Only the
//! insert serializes. Once `append` returns, the entry is durable and will
//! appear in every subsequent materialization. Nothing ever edits or removes
//! an entry; corrections are later actions (`unlike`, `unfollow`).

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::Connection;
use tracing::{debug, info};

use castwire_crypto::ed25519::{Signature, VerifyingKey};
use castwire_db::queries;
use castwire_db::DbError;
use castwire_types::{Action, ActionEnvelope, FeedLimits, LedgerEntry, User};

/// Error types for ledger writes and reads.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The claimed uid has no user record.
    #[error("unknown user: uid {uid}")]
    UnknownUser { uid: i64 },

    /// The envelope's public key does not match the key registered for the
    /// claimed uid. A valid signature under someone else's key must never be
    /// attributed to this uid.
    #[error("public key does not match registered key for uid {uid}")]
    KeyMismatch { uid: i64 },

    /// Signature verification failed over the envelope's exact action bytes.
    #[error("invalid signature")]
    InvalidSignature,

    /// The action bytes do not parse to a known variant, or fail per-variant
    /// validation. The detail is safe to surface to the submitting client.
    #[error("malformed action: {0}")]
    MalformedAction(String),

    /// Underlying database failure.
    #[error("database error: {0}")]
    Db(#[from] DbError),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// The append-only signed action log.
///
/// Shares the daemon's single SQLite connection; the mutex around it is the
/// serialization point for seq assignment.
pub struct Ledger {
    conn: Arc<Mutex<Connection>>,
    limits: FeedLimits,
}

impl Ledger {
    /// Create a ledger over an open Castwire database connection.
    pub fn new(conn: Arc<Mutex<Connection>>, limits: FeedLimits) -> Self {
        Self { conn, limits }
    }

    /// Verify and append a signed action envelope.
    pub fn append(&self, envelope: &ActionEnvelope) -> Result<LedgerEntry> {
        // Gate 1: resolve the claimed user.
        let user = self.resolve_user(envelope.uid)?;

        // Gate 2: bind the claimed key to the registered key. Exact string
        // compare — both sides are canonical lowercase hex.
        if user.pub_key_hex != envelope.pub_key_hex {
            return Err(LedgerError::KeyMismatch { uid: envelope.uid });
        }

        // Gate 3: verify over the exact bytes the client signed. The
        // envelope string is opaque here; parsing happens only after the
        // signature checks out.
        let key = VerifyingKey::from_hex(&envelope.pub_key_hex)
            .map_err(|_| LedgerError::InvalidSignature)?;
        let sig = Signature::from_hex(&envelope.signature_hex)
            .map_err(|_| LedgerError::InvalidSignature)?;
        key.verify(envelope.action_json.as_bytes(), &sig)
            .map_err(|_| LedgerError::InvalidSignature)?;

        // Gate 4: parse and validate the action.
        let action: Action = serde_json::from_str(&envelope.action_json)
            .map_err(|e| LedgerError::MalformedAction(e.to_string()))?;
        action
            .validate(&self.limits)
            .map_err(|e| LedgerError::MalformedAction(e.to_string()))?;

        // Gates 5–6: assign the next seq and persist, atomically. The
        // connection lock is the single seq authority; rowid assignment and
        // the insert commit together or not at all.
        let accepted_at = unix_now();
        let seq = {
            let conn = self.lock();
            queries::ledger::append(
                &conn,
                envelope.uid,
                &envelope.action_json,
                &envelope.signature_hex,
                accepted_at,
            )?
        };

        info!(seq, uid = envelope.uid, "accepted action");

        Ok(LedgerEntry {
            seq,
            uid: envelope.uid,
            action,
            action_json: envelope.action_json.clone(),
            accepted_at,
        })
    }

    /// Read a single entry. `None` is a normal outcome.
    pub fn entry(&self, seq: i64) -> Result<Option<LedgerEntry>> {
        let row = {
            let conn = self.lock();
            match queries::ledger::get(&conn, seq) {
                Ok(row) => row,
                Err(DbError::NotFound(_)) => return Ok(None),
                Err(e) => return Err(e.into()),
            }
        };
        Ok(Some(row_to_entry(row)?))
    }

    /// Snapshot all entries with seq >= `from_seq`, in seq order.
    ///
    /// Readers may observe a slightly stale snapshot but never a torn or
    /// out-of-order one: the log is immutable and grows monotonically.
    pub fn entries_from(&self, from_seq: i64) -> Result<Vec<LedgerEntry>> {
        let rows = {
            let conn = self.lock();
            queries::ledger::list_from(&conn, from_seq)?
        };
        debug!(count = rows.len(), from_seq, "ledger snapshot");
        rows.into_iter().map(row_to_entry).collect()
    }

    /// Number of accepted entries.
    pub fn len(&self) -> Result<u64> {
        let conn = self.lock();
        Ok(queries::ledger::len(&conn)?)
    }

    /// True if no action has ever been accepted.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn resolve_user(&self, uid: i64) -> Result<User> {
        let conn = self.lock();
        match queries::users::get(&conn, uid) {
            Ok(row) => Ok(User {
                uid: row.uid,
                pub_key_hex: row.pub_key_hex,
                display_name: row.display_name,
                registered_at: row.registered_at,
            }),
            Err(DbError::NotFound(_)) => Err(LedgerError::UnknownUser { uid }),
            Err(e) => Err(e.into()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // A poisoned lock means a panic elsewhere; the connection itself is
        // still consistent (SQLite transactions are atomic), so recover it.
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn row_to_entry(row: queries::ledger::LedgerRow) -> Result<LedgerEntry> {
    let action: Action = serde_json::from_str(&row.action_json)
        .map_err(|e| LedgerError::MalformedAction(e.to_string()))?;
    Ok(LedgerEntry {
        seq: row.seq,
        uid: row.uid,
        action,
        action_json: row.action_json,
        accepted_at: row.accepted_at,
    })
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use castwire_crypto::ed25519::KeyPair;

    fn setup() -> (Ledger, KeyPair, i64) {
        let conn = castwire_db::open_memory().expect("open test db");
        let kp = KeyPair::generate();
        let uid =
            queries::users::insert(&conn, &kp.pub_key_hex(), "alice", 0).expect("insert user");
        let ledger = Ledger::new(Arc::new(Mutex::new(conn)), FeedLimits::default());
        (ledger, kp, uid)
    }

    fn sign_envelope(kp: &KeyPair, uid: i64, action: &Action) -> ActionEnvelope {
        let action_json = action.to_canonical_json().expect("serialize");
        let signature = kp.signing_key.sign(action_json.as_bytes());
        ActionEnvelope {
            uid,
            pub_key_hex: kp.pub_key_hex(),
            action_json,
            signature_hex: signature.to_hex(),
        }
    }

    #[test]
    fn test_append_accepts_valid_post() {
        let (ledger, kp, uid) = setup();
        let action = Action::Post {
            content: "hello".to_string(),
            parent_id: None,
        };
        let entry = ledger.append(&sign_envelope(&kp, uid, &action)).expect("append");
        assert_eq!(entry.seq, 1);
        assert_eq!(entry.uid, uid);
        assert_eq!(entry.action, action);
    }

    #[test]
    fn test_unknown_user_rejected() {
        let (ledger, kp, _uid) = setup();
        let action = Action::Post {
            content: "hello".to_string(),
            parent_id: None,
        };
        let envelope = sign_envelope(&kp, 42, &action);
        let err = ledger.append(&envelope).expect_err("unknown uid");
        assert!(matches!(err, LedgerError::UnknownUser { uid: 42 }));
        assert_eq!(ledger.len().expect("len"), 0);
    }

    #[test]
    fn test_key_mismatch_rejected_without_append() {
        let (ledger, _kp, uid) = setup();
        // A different keypair signs a perfectly valid envelope, claiming uid.
        let other = KeyPair::generate();
        let action = Action::Post {
            content: "forged".to_string(),
            parent_id: None,
        };
        let envelope = sign_envelope(&other, uid, &action);
        let err = ledger.append(&envelope).expect_err("key mismatch");
        assert!(matches!(err, LedgerError::KeyMismatch { .. }));
        assert_eq!(ledger.len().expect("len"), 0, "no partial ledger write");
    }

    #[test]
    fn test_tampered_action_json_rejected() {
        let (ledger, kp, uid) = setup();
        let action = Action::Post {
            content: "hello".to_string(),
            parent_id: None,
        };
        let mut envelope = sign_envelope(&kp, uid, &action);
        envelope.action_json = envelope.action_json.replace("hello", "hellp");
        let err = ledger.append(&envelope).expect_err("tampered bytes");
        assert!(matches!(err, LedgerError::InvalidSignature));
        assert_eq!(ledger.len().expect("len"), 0);
    }

    #[test]
    fn test_reserialized_action_rejected() {
        // A signature over canonical bytes does not authorize a differently
        // serialized but semantically equal action.
        let (ledger, kp, uid) = setup();
        let action = Action::Post {
            content: "hello".to_string(),
            parent_id: None,
        };
        let mut envelope = sign_envelope(&kp, uid, &action);
        envelope.action_json = r#"{ "type":"post", "content":"hello" }"#.to_string();
        assert!(matches!(
            ledger.append(&envelope).expect_err("spacing changed"),
            LedgerError::InvalidSignature
        ));
    }

    #[test]
    fn test_unknown_action_type_rejected_after_signature() {
        let (ledger, kp, uid) = setup();
        // Valid signature over bytes that do not parse to a known variant.
        let action_json = r#"{"type":"shout","content":"HI"}"#.to_string();
        let signature = kp.signing_key.sign(action_json.as_bytes());
        let envelope = ActionEnvelope {
            uid,
            pub_key_hex: kp.pub_key_hex(),
            action_json,
            signature_hex: signature.to_hex(),
        };
        let err = ledger.append(&envelope).expect_err("unknown type");
        assert!(matches!(err, LedgerError::MalformedAction(_)));
        assert_eq!(ledger.len().expect("len"), 0);
    }

    #[test]
    fn test_over_length_content_rejected_with_detail() {
        let (ledger, kp, uid) = setup();
        let action = Action::Post {
            content: "a".repeat(281),
            parent_id: None,
        };
        let err = ledger
            .append(&sign_envelope(&kp, uid, &action))
            .expect_err("over limit");
        match err {
            LedgerError::MalformedAction(detail) => {
                assert!(detail.contains("281"), "detail tells the caller the length");
            }
            other => panic!("expected MalformedAction, got {other:?}"),
        }
    }

    #[test]
    fn test_seq_strictly_increasing() {
        let (ledger, kp, uid) = setup();
        for i in 1..=5i64 {
            let action = Action::Post {
                content: format!("post {i}"),
                parent_id: None,
            };
            let entry = ledger.append(&sign_envelope(&kp, uid, &action)).expect("append");
            assert_eq!(entry.seq, i);
        }
        let all = ledger.entries_from(1).expect("snapshot");
        let seqs: Vec<i64> = all.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_entry_absent_is_none() {
        let (ledger, _kp, _uid) = setup();
        assert!(ledger.entry(1).expect("read").is_none());
    }
}
