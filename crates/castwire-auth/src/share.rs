//! Post-scoped share tokens.
//!
//! A share token is an opaque bearer credential bound to exactly one post:
//! the keyed BLAKE3 hash of the post id under a per-server secret, encoded
//! base64url. Verification recomputes the hash and compares in constant
//! time, so a token check leaks nothing about any other post's token. There
//! is no stored token state; revocation means rotating the server secret.

use rusqlite::Connection;
use tracing::info;

use castwire_crypto::blake3::{self, contexts};
use castwire_db::queries;

use crate::Result;

/// Settings key holding the hex-encoded share secret.
const SHARE_SECRET_KEY: &str = "share_secret";

/// Issue a share token granting read access to `post_id`.
pub fn issue_share_token(secret: &[u8; 32], post_id: i64) -> String {
    let mac = share_mac(secret, post_id);
    base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, mac)
}

/// Verify a share token against a specific post id.
///
/// Pure predicate: no side effects, no expiry state beyond the token
/// itself. A `true` result authorizes reading exactly `post_id` (and, by
/// extension, its thread) — never any other post, and never writes.
pub fn auth_post_share_token(secret: &[u8; 32], token: &str, post_id: i64) -> bool {
    let presented: [u8; 32] = match base64::Engine::decode(
        &base64::engine::general_purpose::URL_SAFE_NO_PAD,
        token,
    ) {
        Ok(bytes) => match bytes.try_into() {
            Ok(arr) => arr,
            Err(_) => return false,
        },
        Err(_) => return false,
    };
    let expected = share_mac(secret, post_id);
    blake3::ct_eq_32(&expected, &presented)
}

/// Load the per-server share secret, generating and persisting one on first
/// use.
pub fn load_or_create_secret(conn: &Connection) -> Result<[u8; 32]> {
    if let Some(hex_value) = queries::settings::get(conn, SHARE_SECRET_KEY)? {
        if let Ok(bytes) = hex::decode(&hex_value) {
            if let Ok(secret) = <[u8; 32]>::try_from(bytes) {
                return Ok(secret);
            }
        }
        // Unparseable stored secret: fall through and rotate. Outstanding
        // share links stop working, which is the safe direction.
        info!("stored share secret is invalid, rotating");
    }

    let mut secret = [0u8; 32];
    rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut secret);
    queries::settings::put(conn, SHARE_SECRET_KEY, &hex::encode(secret))?;
    info!("generated new share secret");
    Ok(secret)
}

fn share_mac(secret: &[u8; 32], post_id: i64) -> [u8; 32] {
    // Domain-separate the MAC key from the raw secret so the settings value
    // is never used directly as key material elsewhere.
    let key = blake3::derive_key(contexts::SHARE_TOKEN, secret);
    let mut msg = [0u8; 13];
    msg[..5].copy_from_slice(b"post:");
    msg[5..].copy_from_slice(&post_id.to_le_bytes());
    blake3::keyed_hash(&key, &msg)
}
