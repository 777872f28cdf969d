//! SQL schema definitions.

/// Complete schema for Castwire v1 database.
pub const SCHEMA_V1: &str = r#"
-- ============================================================
-- Identity
-- ============================================================

CREATE TABLE IF NOT EXISTS users (
    uid INTEGER PRIMARY KEY AUTOINCREMENT,
    pub_key_hex TEXT NOT NULL UNIQUE,
    display_name TEXT NOT NULL,
    registered_at INTEGER NOT NULL
);

-- ============================================================
-- Signed action ledger (append-only)
-- ============================================================

CREATE TABLE IF NOT EXISTS ledger (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    uid INTEGER NOT NULL REFERENCES users(uid),
    action_json TEXT NOT NULL,
    signature_hex TEXT NOT NULL,
    accepted_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_ledger_uid ON ledger(uid);

-- ============================================================
-- Sessions (bearer tokens, stored hashed)
-- ============================================================

CREATE TABLE IF NOT EXISTS sessions (
    token_hash BLOB PRIMARY KEY,
    uid INTEGER NOT NULL REFERENCES users(uid),
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sessions_uid ON sessions(uid);

-- ============================================================
-- Settings & server secrets
-- ============================================================

CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;
