//! Domain-separated BLAKE3 hashing for Castwire.
//!
//! BLAKE3 backs the bearer-token machinery: share tokens are a keyed hash of
//! the post id under a per-server secret, and session tokens are stored as a
//! derived hash so the database never holds the bearer form. Cross-domain
//! collisions are prevented by mandatory domain separation.
//!
//! ## Modes
//!
//! - [`hash`] — pure hashing
//! - [`derive_key`] — key derivation with a registered context string
//! - [`keyed_hash`] — keyed MAC/PRF for token verification

/// Registered BLAKE3 context strings. Using an unregistered context string
/// is a protocol violation.
pub mod contexts {
    pub const SHARE_TOKEN: &str = "Castwire v1 share-token";
    pub const SESSION_TOKEN_ID: &str = "Castwire v1 session-token-id";

    /// All registered context strings. Used for validation.
    pub const ALL_CONTEXTS: &[&str] = &[SHARE_TOKEN, SESSION_TOKEN_ID];
}

/// Compute BLAKE3 hash of the input data.
pub fn hash(data: &[u8]) -> [u8; 32] {
    *::blake3::hash(data).as_bytes()
}

/// Derive a key using BLAKE3's built-in key derivation mode.
///
/// `context` must be one of the registered strings in [`contexts`].
pub fn derive_key(context: &str, material: &[u8]) -> [u8; 32] {
    ::blake3::derive_key(context, material)
}

/// Compute a keyed BLAKE3 hash (MAC/PRF mode).
pub fn keyed_hash(key: &[u8; 32], data: &[u8]) -> [u8; 32] {
    *::blake3::keyed_hash(key, data).as_bytes()
}

/// Constant-time equality for 32-byte values.
///
/// Used for token comparison: the loop always touches all 32 bytes, so the
/// comparison cost does not depend on where the first mismatch occurs.
pub fn ct_eq_32(a: &[u8; 32], b: &[u8; 32]) -> bool {
    let mut diff = 0u8;
    for i in 0..32 {
        diff |= a[i] ^ b[i];
    }
    diff == 0
}
