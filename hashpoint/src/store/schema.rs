//! SQLite schema for the persistent derivation cache.

use rusqlite::Connection;

use super::StoreError;

/// Creates both cache tables if they do not exist yet.
///
/// Row ids are AUTOINCREMENT so they grow monotonically and are never
/// reused; the pruning routine depends on that to identify the oldest
/// rows.
pub(crate) fn initialize(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS index_values (
            id    INTEGER PRIMARY KEY AUTOINCREMENT,
            date  TEXT NOT NULL,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS fractions (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            date         TEXT NOT NULL,
            under_rule   INTEGER NOT NULL,
            lat_fraction REAL NOT NULL,
            lon_fraction REAL NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_index_values_date ON index_values(date);
        CREATE INDEX IF NOT EXISTS idx_fractions_key ON fractions(date, under_rule);
        ",
    )?;

    Ok(())
}
