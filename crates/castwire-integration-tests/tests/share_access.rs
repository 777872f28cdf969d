//! Integration test: post-scoped share access for anonymous viewers.
//!
//! A share token minted for one post lets a viewer with no session read
//! exactly that post and its ancestor thread — never another post, and
//! never any feed.

use std::sync::{Arc, Mutex};

use castwire_crypto::ed25519::KeyPair;
use castwire_db::queries;
use castwire_feed::Materializer;
use castwire_ledger::Ledger;
use castwire_types::{Action, ActionEnvelope, FeedLimits, User};

/// Anonymous viewer uid used by share-token reads.
const ANONYMOUS_UID: i64 = -1;

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

#[tokio::test]
async fn share_token_scopes_reads_to_one_post() {
    let conn = castwire_db::open_memory().expect("open");
    let kp = KeyPair::generate();
    let uid = queries::users::insert(&conn, &kp.pub_key_hex(), "alice", 0).expect("register");
    let secret = castwire_auth::load_or_create_secret(&conn).expect("share secret");

    let user = User {
        uid,
        pub_key_hex: kp.pub_key_hex(),
        display_name: "alice".to_string(),
        registered_at: 0,
    };

    let ledger = Ledger::new(Arc::new(Mutex::new(conn)), FeedLimits::default());

    // A reply chain: 1 <- 2 <- 3, plus unrelated posts 4 and 5.
    let mut entries = Vec::new();
    for (content, parent) in [
        ("root", None),
        ("first reply", Some(1)),
        ("second reply", Some(2)),
        ("unrelated a", None),
        ("unrelated b", None),
    ] {
        entries.push(
            ledger
                .append(&sign_envelope(
                    &kp,
                    uid,
                    &Action::Post {
                        content: content.to_string(),
                        parent_id: parent,
                    },
                ))
                .expect("append"),
        );
    }
    let feed = Materializer::rebuild(vec![user], &entries);

    // Token minted for the deepest reply.
    let token = castwire_auth::issue_share_token(&secret, 3);

    // The token authorizes exactly post 3.
    assert!(castwire_auth::auth_post_share_token(&secret, &token, 3));
    for other in [1, 2, 4, 5] {
        assert!(
            !castwire_auth::auth_post_share_token(&secret, &token, other),
            "token for post 3 must not authorize post {other}"
        );
    }

    // With the authorized post id, the anonymous viewer can load the post
    // and its full ancestor thread.
    let post = feed.load_post(ANONYMOUS_UID, 3).expect("shared post visible");
    assert_eq!(post.content, "second reply");

    let thread = feed.load_thread(ANONYMOUS_UID, 3).expect("thread loads");
    let ids: Vec<i64> = thread.posts.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 2, 3], "ancestors come along with the share");

    // A tampered token authorizes nothing.
    let mut chars: Vec<char> = token.chars().collect();
    chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
    let tampered: String = chars.into_iter().collect();
    assert!(!castwire_auth::auth_post_share_token(&secret, &tampered, 3));
}

#[tokio::test]
async fn share_secret_survives_restart() {
    // Tokens outlive the process as long as the stored secret does.
    let conn = castwire_db::open_memory().expect("open");
    let secret = castwire_auth::load_or_create_secret(&conn).expect("first load");
    let token = castwire_auth::issue_share_token(&secret, 42);

    let reloaded = castwire_auth::load_or_create_secret(&conn).expect("reload");
    assert!(castwire_auth::auth_post_share_token(&reloaded, &token, 42));
    assert!(!castwire_auth::auth_post_share_token(&reloaded, &token, 43));
}
