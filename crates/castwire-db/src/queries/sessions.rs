//! Session query functions.
//!
//! Sessions map a hashed bearer token to a uid. Only the hash is stored;
//! the bearer form exists client-side only.

use rusqlite::Connection;

use crate::{DbError, Result};

/// Insert a session for a user.
pub fn insert(conn: &Connection, token_hash: &[u8; 32], uid: i64, created_at: u64) -> Result<()> {
    conn.execute(
        "INSERT INTO sessions (token_hash, uid, created_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![token_hash.as_slice(), uid, created_at as i64],
    )?;
    Ok(())
}

/// Look up the uid for a session token hash. `None` if no such session.
pub fn lookup(conn: &Connection, token_hash: &[u8; 32]) -> Result<Option<i64>> {
    let result = conn.query_row(
        "SELECT uid FROM sessions WHERE token_hash = ?1",
        [token_hash.as_slice()],
        |row| row.get(0),
    );
    match result {
        Ok(uid) => Ok(Some(uid)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(DbError::Sqlite(e)),
    }
}

/// Delete a session (logout).
pub fn delete(conn: &Connection, token_hash: &[u8; 32]) -> Result<()> {
    conn.execute(
        "DELETE FROM sessions WHERE token_hash = ?1",
        [token_hash.as_slice()],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::users;

    #[test]
    fn test_session_lifecycle() {
        let conn = crate::open_memory().expect("open test db");
        let uid = users::insert(&conn, &"ab".repeat(32), "alice", 0).expect("user");

        let hash = [7u8; 32];
        insert(&conn, &hash, uid, 100).expect("insert");
        assert_eq!(lookup(&conn, &hash).expect("lookup"), Some(uid));

        delete(&conn, &hash).expect("delete");
        assert_eq!(lookup(&conn, &hash).expect("lookup"), None);
    }

    #[test]
    fn test_unknown_token_is_none_not_error() {
        let conn = crate::open_memory().expect("open test db");
        assert_eq!(lookup(&conn, &[1u8; 32]).expect("lookup"), None);
    }
}
