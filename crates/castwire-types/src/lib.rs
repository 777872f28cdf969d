//! # castwire-types
//!
//! Shared domain types for the Castwire workspace: users, the closed set of
//! signed action variants, the transport envelope, ledger entries, and the
//! materialized read models (posts, threads, feeds).

pub mod action;
pub mod envelope;
pub mod feed;
pub mod ledger;
pub mod user;

pub use action::{Action, ActionError, FeedLimits};
pub use envelope::ActionEnvelope;
pub use feed::{FeedTab, Post, Thread};
pub use ledger::LedgerEntry;
pub use user::User;

/// Default maximum post length, in Unicode scalar values.
pub const DEFAULT_MAX_POST_LENGTH: usize = 280;

/// Default maximum display-name length at registration.
pub const MAX_DISPLAY_NAME_LENGTH: usize = 64;
