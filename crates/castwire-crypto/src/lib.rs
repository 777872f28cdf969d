//! # castwire-crypto
//!
//! Cryptographic primitives for the Castwire signed-action protocol.
//!
//! Every state change in Castwire is a user-signed action. This crate owns
//! the signature suite and the token-derivation helpers; no algorithm
//! negotiation is permitted — the suite is fixed.
//!
//! ## Modules
//!
//! - [`ed25519`] — Ed25519 signing and verification (RFC 8032), with the
//!   canonical lowercase-hex transport form for keys and signatures
//! - [`blake3`] — Domain-separated BLAKE3 hashing: share-token and
//!   session-token derivation, plus a constant-time comparator

pub mod blake3;
pub mod ed25519;

/// Error types for cryptographic operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Ed25519 signature verification failed.
    #[error("signature verification failed")]
    SignatureVerification,

    /// Hex decoding failed or decoded to the wrong length.
    #[error("invalid hex encoding: {0}")]
    InvalidHex(String),

    /// Invalid input data (e.g. an off-curve public key).
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
