//! # castwire-auth
//!
//! The access guard: resolves who a request is from, and what a bearer
//! share token lets an otherwise-anonymous request see.
//!
//! Two independent mechanisms:
//!
//! - [`session`] — bearer session tokens issued at registration/login.
//!   `authenticate_request` resolves a token to a [`User`], returning
//!   `Ok(None)` (anonymous) rather than an error when there is no valid
//!   session — callers route anonymous viewers to public views or sign-in.
//! - [`share`] — post-scoped share tokens. Verification is a pure keyed-hash
//!   predicate: a valid token for one post grants read access to exactly
//!   that post and its thread, nothing else, and verification cost is
//!   independent of any other post's secret.

pub mod session;
pub mod share;

pub use session::{authenticate_request, create_session, destroy_session};
pub use share::{auth_post_share_token, issue_share_token, load_or_create_secret};

/// Error types for access-guard operations.
///
/// Note the deliberate asymmetry: an *invalid credential* is not an error
/// (it resolves to anonymous / `false`); errors are reserved for the
/// database failing underneath us.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("database error: {0}")]
    Db(#[from] castwire_db::DbError),
}

pub type Result<T> = std::result::Result<T, AuthError>;
