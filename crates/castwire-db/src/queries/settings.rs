//! Settings query functions.

use rusqlite::Connection;

use crate::{DbError, Result};

/// Get a setting value. `None` if unset.
pub fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
    let result = conn.query_row(
        "SELECT value FROM settings WHERE key = ?1",
        [key],
        |row| row.get(0),
    );
    match result {
        Ok(value) => Ok(Some(value)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(DbError::Sqlite(e)),
    }
}

/// Set a setting value, replacing any existing one.
pub fn put(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
        rusqlite::params![key, value],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_put() {
        let conn = crate::open_memory().expect("open test db");
        assert_eq!(get(&conn, "share_secret").expect("get"), None);

        put(&conn, "share_secret", "deadbeef").expect("put");
        assert_eq!(
            get(&conn, "share_secret").expect("get"),
            Some("deadbeef".to_string())
        );

        put(&conn, "share_secret", "cafef00d").expect("replace");
        assert_eq!(
            get(&conn, "share_secret").expect("get"),
            Some("cafef00d".to_string())
        );
    }
}
