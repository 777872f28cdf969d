//! Ledger query functions.
//!
//! The ledger is append-only: this module exposes INSERT and SELECT only.
//! Sequence numbers are SQLite rowids (AUTOINCREMENT), so they are assigned
//! by a single authority, strictly increasing, and never reused.

use rusqlite::Connection;

use crate::{DbError, Result};

/// Append an accepted action, returning the assigned seq.
///
/// The caller is responsible for holding the writer's serialization lock
/// around this call; the INSERT plus `last_insert_rowid` must not interleave
/// with another append on the same connection.
pub fn append(
    conn: &Connection,
    uid: i64,
    action_json: &str,
    signature_hex: &str,
    accepted_at: u64,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO ledger (uid, action_json, signature_hex, accepted_at)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![uid, action_json, signature_hex, accepted_at as i64],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Get a single ledger entry by seq.
pub fn get(conn: &Connection, seq: i64) -> Result<LedgerRow> {
    conn.query_row(
        "SELECT seq, uid, action_json, signature_hex, accepted_at
         FROM ledger WHERE seq = ?1",
        [seq],
        row_to_entry,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound("ledger entry".into()),
        other => DbError::Sqlite(other),
    })
}

/// List all entries with seq >= `from_seq`, in seq order.
pub fn list_from(conn: &Connection, from_seq: i64) -> Result<Vec<LedgerRow>> {
    let mut stmt = conn.prepare(
        "SELECT seq, uid, action_json, signature_hex, accepted_at
         FROM ledger WHERE seq >= ?1 ORDER BY seq ASC",
    )?;

    let rows = stmt
        .query_map([from_seq], row_to_entry)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Number of entries in the ledger.
pub fn len(conn: &Connection) -> Result<u64> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM ledger", [], |row| row.get(0))?;
    Ok(n as u64)
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<LedgerRow> {
    Ok(LedgerRow {
        seq: row.get(0)?,
        uid: row.get(1)?,
        action_json: row.get(2)?,
        signature_hex: row.get(3)?,
        accepted_at: row.get::<_, i64>(4)? as u64,
    })
}

/// A raw ledger row from the database.
#[derive(Debug, Clone)]
pub struct LedgerRow {
    pub seq: i64,
    pub uid: i64,
    pub action_json: String,
    pub signature_hex: String,
    pub accepted_at: u64,
}
