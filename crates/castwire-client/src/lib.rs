//! # castwire-client
//!
//! The client side of the action submission protocol: hold a local signing
//! keypair, build and sign action envelopes, and talk to the daemon over
//! its Unix-socket JSON-RPC surface.
//!
//! The submission flow is polymorphic over caller state: an authenticated
//! caller signs and submits; an anonymous caller short-circuits to
//! [`SubmitOutcome::LoginRequired`] before any cryptographic work — no
//! error is surfaced and no partial envelope leaves the process.

pub mod identity;
pub mod rpc;

pub use identity::{prepare, Identity, Signer, SubmitOutcome};
pub use rpc::RpcClient;

/// Error types for client-side operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Action could not be serialized for signing.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Transport failure talking to the daemon.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The daemon returned a JSON-RPC error.
    #[error("rpc error {code}: {message}")]
    Rpc {
        code: i32,
        message: String,
        data: Option<serde_json::Value>,
    },

    /// The daemon's response could not be parsed.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
