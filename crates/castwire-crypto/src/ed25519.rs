//! Ed25519 signing and verification (RFC 8032).
//!
//! Ed25519 is the only signature algorithm in Castwire. It is used for:
//! - user identity keypairs (one active key per uid)
//! - signing canonical action bytes on the client
//! - verifying action envelopes in the ledger writer
//!
//! Keys and signatures travel as lowercase hex strings; `from_hex` accepts
//! the canonical form only and rejects anything that does not decode to the
//! exact length or does not land on the curve.

use ed25519_dalek::{Signer, Verifier};
use serde::{Deserialize, Serialize};

use crate::{CryptoError, Result};

/// An Ed25519 signing key (private key).
///
/// Key material is zeroized on drop by `ed25519-dalek` (its `zeroize`
/// feature).
#[derive(Clone)]
pub struct SigningKey {
    inner: ed25519_dalek::SigningKey,
}

/// An Ed25519 verification key (public key).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyingKey {
    inner: ed25519_dalek::VerifyingKey,
}

/// An Ed25519 signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    inner: ed25519_dalek::Signature,
}

/// An Ed25519 keypair held by a client for signing actions.
pub struct KeyPair {
    pub signing_key: SigningKey,
    pub verifying_key: VerifyingKey,
}

impl SigningKey {
    /// Generate a new random signing key.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self {
            inner: ed25519_dalek::SigningKey::generate(&mut csprng),
        }
    }

    /// Create a signing key from raw bytes.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            inner: ed25519_dalek::SigningKey::from_bytes(bytes),
        }
    }

    /// Get the raw bytes of this signing key.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes()
    }

    /// Get the corresponding verifying key.
    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey {
            inner: self.inner.verifying_key(),
        }
    }

    /// Sign a message. Signing is deterministic per RFC 8032.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature {
            inner: self.inner.sign(message),
        }
    }
}

impl VerifyingKey {
    /// Create a verifying key from raw bytes.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        let inner = ed25519_dalek::VerifyingKey::from_bytes(bytes)
            .map_err(|e| CryptoError::InvalidInput(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Parse the canonical lowercase-hex transport form (64 hex chars).
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let bytes = decode_hex_exact::<32>(hex_str)?;
        Self::from_bytes(&bytes)
    }

    /// The canonical lowercase-hex transport form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.inner.as_bytes())
    }

    /// Get the raw bytes of this verifying key.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes()
    }

    /// Get the raw bytes as a slice.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.inner.as_bytes()
    }

    /// Verify a signature over a message.
    ///
    /// Rejects on any mismatch — wrong key, tampered message, tampered
    /// signature — with the same opaque error; there is no partial success.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<()> {
        self.inner
            .verify(message, &signature.inner)
            .map_err(|_| CryptoError::SignatureVerification)
    }
}

impl Signature {
    /// Create a signature from raw bytes.
    pub fn from_bytes(bytes: &[u8; 64]) -> Self {
        Self {
            inner: ed25519_dalek::Signature::from_bytes(bytes),
        }
    }

    /// Parse the lowercase-hex transport form (128 hex chars).
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let bytes = decode_hex_exact::<64>(hex_str)?;
        Ok(Self::from_bytes(&bytes))
    }

    /// The lowercase-hex transport form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.inner.to_bytes())
    }

    /// Get the raw bytes of this signature.
    pub fn to_bytes(&self) -> [u8; 64] {
        self.inner.to_bytes()
    }
}

impl KeyPair {
    /// Generate a new random Ed25519 keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate();
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Create a keypair from a signing key's raw bytes.
    pub fn from_bytes(secret: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(secret);
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// The public key's canonical lowercase-hex transport form.
    pub fn pub_key_hex(&self) -> String {
        self.verifying_key.to_hex()
    }
}

/// Decode exactly `N` bytes of lowercase hex.
///
/// Uppercase digits are rejected: the transport form is canonical so that
/// the registered-key comparison in the ledger writer is an exact string
/// match.
fn decode_hex_exact<const N: usize>(hex_str: &str) -> Result<[u8; N]> {
    if hex_str.bytes().any(|b| b.is_ascii_uppercase()) {
        return Err(CryptoError::InvalidHex(
            "hex must be lowercase".to_string(),
        ));
    }
    let bytes = hex::decode(hex_str).map_err(|e| CryptoError::InvalidHex(e.to_string()))?;
    bytes.try_into().map_err(|_| {
        CryptoError::InvalidHex(format!("expected {} hex chars", N * 2))
    })
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("public", &self.verifying_key())
            .finish()
    }
}
