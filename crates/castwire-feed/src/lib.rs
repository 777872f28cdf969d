//! # castwire-feed
//!
//! The feed materializer: derives posts, reply threads, and profile feeds
//! from the signed action ledger.
//!
//! Everything here is a cache. The ledger is the source of truth; the
//! materializer can be dropped and rebuilt from the log at any time with
//! [`Materializer::rebuild`], and is updated incrementally with
//! [`Materializer::apply`] after each accepted append.
//!
//! Reads never take the ledger's writer lock. A reader may observe a
//! slightly stale snapshot but never a torn one: entries are applied in seq
//! order and each apply is a single `&mut` call.

mod materializer;

pub use materializer::Materializer;

use castwire_types::Thread;

/// Error types for feed reads.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The ancestry chain of `post_id` contains a cycle and cannot be fully
    /// reconstructed. `partial` is the longest valid root-first prefix, so
    /// callers can render a truncated thread instead of failing the read.
    #[error("corrupt thread ancestry for post {post_id}")]
    CorruptThread { post_id: i64, partial: Thread },
}

pub type Result<T> = std::result::Result<T, FeedError>;
