//! Bearer session tokens.
//!
//! The bearer form is 32 random bytes, base64url without padding. Only a
//! BLAKE3-derived hash is stored; a database leak does not leak live
//! credentials.

use rusqlite::Connection;

use castwire_crypto::blake3::{self, contexts};
use castwire_db::queries;
use castwire_types::User;

use crate::Result;

/// Issue a new session token for a user. Returns the bearer form; only its
/// hash touches the database.
pub fn create_session(conn: &Connection, uid: i64, created_at: u64) -> Result<String> {
    let mut secret = [0u8; 32];
    rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut secret);

    let token = base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, secret);
    let token_hash = blake3::derive_key(contexts::SESSION_TOKEN_ID, &secret);
    queries::sessions::insert(conn, &token_hash, uid, created_at)?;
    Ok(token)
}

/// Resolve a request's bearer session token to its user.
///
/// Returns `Ok(None)` for a missing, malformed, or unknown token — the
/// caller treats that as an anonymous viewer, never as a failure.
pub fn authenticate_request(conn: &Connection, token: Option<&str>) -> Result<Option<User>> {
    let token = match token {
        Some(t) => t,
        None => return Ok(None),
    };

    let secret = match decode_token(token) {
        Some(secret) => secret,
        None => return Ok(None),
    };

    let token_hash = blake3::derive_key(contexts::SESSION_TOKEN_ID, &secret);
    let uid = match queries::sessions::lookup(conn, &token_hash)? {
        Some(uid) => uid,
        None => return Ok(None),
    };

    let row = match queries::users::get(conn, uid) {
        Ok(row) => row,
        Err(castwire_db::DbError::NotFound(_)) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    Ok(Some(User {
        uid: row.uid,
        pub_key_hex: row.pub_key_hex,
        display_name: row.display_name,
        registered_at: row.registered_at,
    }))
}

/// Revoke a session (logout). Unknown tokens are a silent no-op.
pub fn destroy_session(conn: &Connection, token: &str) -> Result<()> {
    if let Some(secret) = decode_token(token) {
        let token_hash = blake3::derive_key(contexts::SESSION_TOKEN_ID, &secret);
        queries::sessions::delete(conn, &token_hash)?;
    }
    Ok(())
}

fn decode_token(token: &str) -> Option<[u8; 32]> {
    let bytes = base64::Engine::decode(
        &base64::engine::general_purpose::URL_SAFE_NO_PAD,
        token,
    )
    .ok()?;
    bytes.try_into().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (Connection, i64) {
        let conn = castwire_db::open_memory().expect("open test db");
        let uid = queries::users::insert(&conn, &"ab".repeat(32), "alice", 0).expect("user");
        (conn, uid)
    }

    #[test]
    fn test_session_roundtrip() {
        let (conn, uid) = test_db();
        let token = create_session(&conn, uid, 100).expect("create");

        let user = authenticate_request(&conn, Some(&token))
            .expect("auth")
            .expect("session resolves");
        assert_eq!(user.uid, uid);
        assert_eq!(user.display_name, "alice");
    }

    #[test]
    fn test_missing_token_is_anonymous() {
        let (conn, _uid) = test_db();
        assert!(authenticate_request(&conn, None).expect("auth").is_none());
    }

    #[test]
    fn test_garbage_token_is_anonymous_not_error() {
        let (conn, _uid) = test_db();
        for junk in ["", "not base64 !!!", "aGVsbG8"] {
            assert!(
                authenticate_request(&conn, Some(junk)).expect("auth").is_none(),
                "junk token {junk:?} must resolve to anonymous"
            );
        }
    }

    #[test]
    fn test_unknown_token_is_anonymous() {
        let (conn, _uid) = test_db();
        let stranger =
            base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, [9u8; 32]);
        assert!(authenticate_request(&conn, Some(&stranger))
            .expect("auth")
            .is_none());
    }

    #[test]
    fn test_destroy_session() {
        let (conn, uid) = test_db();
        let token = create_session(&conn, uid, 100).expect("create");
        destroy_session(&conn, &token).expect("destroy");
        assert!(authenticate_request(&conn, Some(&token))
            .expect("auth")
            .is_none());
    }

    #[test]
    fn test_bearer_form_not_stored() {
        let (conn, uid) = test_db();
        let token = create_session(&conn, uid, 100).expect("create");
        let secret = decode_token(&token).expect("decode");

        // The raw secret must not appear as any stored token_hash.
        let stored: Vec<Vec<u8>> = {
            let mut stmt = conn
                .prepare("SELECT token_hash FROM sessions")
                .expect("prepare");
            let rows = stmt
                .query_map([], |row| row.get::<_, Vec<u8>>(0))
                .expect("query")
                .collect::<std::result::Result<Vec<_>, _>>()
                .expect("rows");
            rows
        };
        assert!(!stored.is_empty());
        for hash in stored {
            assert_ne!(hash.as_slice(), secret.as_slice());
        }
    }
}
