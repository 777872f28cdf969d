//! Database query functions organized by domain.

pub mod ledger;
pub mod sessions;
pub mod settings;
pub mod users;
