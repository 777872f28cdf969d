//! Integration test: the submission security gates.
//!
//! Every forged, tampered, or malformed submission must be rejected with
//! no ledger write; concurrent honest submissions must each get a unique
//! seq forming the contiguous range 1..=N.

use std::sync::{Arc, Mutex};

use castwire_crypto::ed25519::KeyPair;
use castwire_db::queries;
use castwire_ledger::{Ledger, LedgerError};
use castwire_types::{Action, ActionEnvelope, FeedLimits};

fn sign_envelope(kp: &KeyPair, uid: i64, action: &Action) -> ActionEnvelope {
    let action_json = action.to_canonical_json().expect("action serializes");
    let signature = kp.signing_key.sign(action_json.as_bytes());
    ActionEnvelope {
        uid,
        pub_key_hex: kp.pub_key_hex(),
        action_json,
        signature_hex: signature.to_hex(),
    }
}

fn setup_user(display_name: &str) -> (Ledger, KeyPair, i64) {
    let conn = castwire_db::open_memory().expect("open");
    let kp = KeyPair::generate();
    let uid = queries::users::insert(&conn, &kp.pub_key_hex(), display_name, 0).expect("register");
    let ledger = Ledger::new(Arc::new(Mutex::new(conn)), FeedLimits::default());
    (ledger, kp, uid)
}

#[tokio::test]
async fn forged_submissions_leave_ledger_unchanged() {
    let (ledger, kp, uid) = setup_user("alice");

    // A stranger signs a valid envelope claiming alice's uid: the signature
    // is genuine under the stranger's key, but the key is not alice's.
    let stranger = KeyPair::generate();
    let forged = sign_envelope(
        &stranger,
        uid,
        &Action::Post {
            content: "i am alice, trust me".to_string(),
            parent_id: None,
        },
    );
    assert!(matches!(
        ledger.append(&forged).expect_err("forgery rejected"),
        LedgerError::KeyMismatch { .. }
    ));

    // Tampering with one byte of the signed payload breaks the signature.
    let mut tampered = sign_envelope(
        &kp,
        uid,
        &Action::Post {
            content: "original".to_string(),
            parent_id: None,
        },
    );
    tampered.action_json = tampered.action_json.replace("original", "Original");
    assert!(matches!(
        ledger.append(&tampered).expect_err("tamper rejected"),
        LedgerError::InvalidSignature
    ));

    // An unknown uid is rejected before any cryptography runs.
    let unknown = sign_envelope(
        &kp,
        999,
        &Action::Post {
            content: "ghost".to_string(),
            parent_id: None,
        },
    );
    assert!(matches!(
        ledger.append(&unknown).expect_err("unknown uid rejected"),
        LedgerError::UnknownUser { uid: 999 }
    ));

    // Nothing above touched the log.
    assert!(ledger.is_empty().expect("is_empty"));
    assert!(ledger.entry(1).expect("read").is_none());
}

#[tokio::test]
async fn signature_covers_exact_bytes_not_meaning() {
    let (ledger, kp, uid) = setup_user("alice");

    // Re-serializing the action with different whitespace preserves the
    // meaning but changes the bytes; the signature no longer covers them.
    let mut envelope = sign_envelope(
        &kp,
        uid,
        &Action::Post {
            content: "hi".to_string(),
            parent_id: None,
        },
    );
    envelope.action_json = r#"{ "type": "post", "content": "hi" }"#.to_string();
    assert!(matches!(
        ledger.append(&envelope).expect_err("bytes changed"),
        LedgerError::InvalidSignature
    ));

    // A correctly signed envelope over garbage bytes passes the signature
    // gate and fails the parse gate.
    let action_json = r#"{"type":"megaphone","volume":11}"#.to_string();
    let signature = kp.signing_key.sign(action_json.as_bytes());
    let envelope = ActionEnvelope {
        uid,
        pub_key_hex: kp.pub_key_hex(),
        action_json,
        signature_hex: signature.to_hex(),
    };
    assert!(matches!(
        ledger.append(&envelope).expect_err("unknown variant"),
        LedgerError::MalformedAction(_)
    ));

    assert!(ledger.is_empty().expect("is_empty"));
}

#[tokio::test]
async fn post_length_boundary() {
    let (ledger, kp, uid) = setup_user("alice");

    // Exactly at the limit is accepted. Multibyte characters count as
    // scalar values, not bytes.
    let at_limit = "é".repeat(280);
    let entry = ledger
        .append(&sign_envelope(
            &kp,
            uid,
            &Action::Post {
                content: at_limit,
                parent_id: None,
            },
        ))
        .expect("280 scalar values accepted");
    assert_eq!(entry.seq, 1);

    // One over is rejected after signature verification.
    let over = "é".repeat(281);
    assert!(matches!(
        ledger
            .append(&sign_envelope(
                &kp,
                uid,
                &Action::Post {
                    content: over,
                    parent_id: None,
                },
            ))
            .expect_err("281 rejected"),
        LedgerError::MalformedAction(_)
    ));

    // Whitespace-only content is rejected.
    assert!(matches!(
        ledger
            .append(&sign_envelope(
                &kp,
                uid,
                &Action::Post {
                    content: "   \n\t ".to_string(),
                    parent_id: None,
                },
            ))
            .expect_err("blank rejected"),
        LedgerError::MalformedAction(_)
    ));

    assert_eq!(ledger.len().expect("len"), 1);
}

#[tokio::test]
async fn concurrent_appends_assign_contiguous_seqs() {
    let (ledger, kp, uid) = setup_user("alice");
    let ledger = Arc::new(ledger);
    let kp = Arc::new(kp);

    const WRITERS: usize = 8;
    const PER_WRITER: usize = 5;

    let mut handles = Vec::new();
    for w in 0..WRITERS {
        let ledger = ledger.clone();
        let kp = kp.clone();
        handles.push(std::thread::spawn(move || {
            let mut seqs = Vec::new();
            for i in 0..PER_WRITER {
                let envelope = sign_envelope(
                    &kp,
                    uid,
                    &Action::Post {
                        content: format!("writer {w} post {i}"),
                        parent_id: None,
                    },
                );
                seqs.push(ledger.append(&envelope).expect("append").seq);
            }
            seqs
        }));
    }

    let mut all_seqs: Vec<i64> = Vec::new();
    for handle in handles {
        let seqs = handle.join().expect("writer thread");
        // Each writer observes its own seqs strictly increasing.
        assert!(seqs.windows(2).all(|w| w[0] < w[1]));
        all_seqs.extend(seqs);
    }

    // Across all writers: every seq unique, forming exactly 1..=N.
    all_seqs.sort_unstable();
    let expected: Vec<i64> = (1..=(WRITERS * PER_WRITER) as i64).collect();
    assert_eq!(all_seqs, expected, "no gaps, no duplicates");

    // The persisted log agrees.
    let entries = ledger.entries_from(1).expect("snapshot");
    assert_eq!(entries.len(), WRITERS * PER_WRITER);
    assert!(entries.windows(2).all(|w| w[0].seq < w[1].seq));
}
