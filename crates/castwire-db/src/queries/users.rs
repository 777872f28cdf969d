//! User query functions.

use rusqlite::Connection;

use crate::{DbError, Result};

/// Insert a new user, returning the assigned uid.
///
/// The uid comes from SQLite AUTOINCREMENT and is never reused.
pub fn insert(
    conn: &Connection,
    pub_key_hex: &str,
    display_name: &str,
    registered_at: u64,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO users (pub_key_hex, display_name, registered_at)
         VALUES (?1, ?2, ?3)",
        rusqlite::params![pub_key_hex, display_name, registered_at as i64],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DbError::Constraint("public key already registered".into())
        }
        other => DbError::Sqlite(other),
    })?;
    Ok(conn.last_insert_rowid())
}

/// Get a user by uid.
pub fn get(conn: &Connection, uid: i64) -> Result<UserRow> {
    conn.query_row(
        "SELECT uid, pub_key_hex, display_name, registered_at
         FROM users WHERE uid = ?1",
        [uid],
        row_to_user,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound("user".into()),
        other => DbError::Sqlite(other),
    })
}

/// Get a user by registered public key.
pub fn get_by_pub_key(conn: &Connection, pub_key_hex: &str) -> Result<UserRow> {
    conn.query_row(
        "SELECT uid, pub_key_hex, display_name, registered_at
         FROM users WHERE pub_key_hex = ?1",
        [pub_key_hex],
        row_to_user,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound("user".into()),
        other => DbError::Sqlite(other),
    })
}

/// List all users in uid order.
pub fn list(conn: &Connection) -> Result<Vec<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT uid, pub_key_hex, display_name, registered_at
         FROM users ORDER BY uid ASC",
    )?;

    let rows = stmt
        .query_map([], row_to_user)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Total number of registered users.
pub fn count(conn: &Connection) -> Result<u64> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    Ok(n as u64)
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        uid: row.get(0)?,
        pub_key_hex: row.get(1)?,
        display_name: row.get(2)?,
        registered_at: row.get::<_, i64>(3)? as u64,
    })
}

/// A raw user row from the database.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub uid: i64,
    pub pub_key_hex: String,
    pub display_name: String,
    pub registered_at: u64,
}
