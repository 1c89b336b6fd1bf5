//! Durable two-table derivation cache.
//!
//! One table holds raw index values keyed by effective-date string; the
//! other holds derived fraction pairs keyed by (effective date, 30W-rule
//! flag). Neither is keyed by graticule: every cell sharing an effective
//! date shares the index value, and every cell sharing date and rule flag
//! shares the fraction pair.
//!
//! Inserts are idempotent (an existing key is left alone, not an error),
//! and each table is pruned independently to a configured maximum row
//! count, oldest row id first. All access goes through a single internal
//! connection guarded by a lock, so store operations are mutually
//! exclusive.

mod schema;

use std::path::Path;

use chrono::NaiveDate;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from the persistent store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying database reported an error.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// The persistent derivation cache.
///
/// Create one per host session with [`Store::open`] (or
/// [`Store::open_in_memory`] in tests) and inject it into the engine;
/// dropping it closes the connection.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Opens (creating if necessary) the cache database at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens a fresh in-memory cache database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Looks up the raw index value stored for an effective date.
    pub fn index_value(&self, effective_date: NaiveDate) -> Result<Option<String>, StoreError> {
        let conn = self.conn.lock();
        let value = conn
            .query_row(
                "SELECT value FROM index_values WHERE date = ?1",
                params![date_key(effective_date)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Stores a raw index value for an effective date.
    ///
    /// A value already stored for the date wins; concurrent resolutions
    /// racing on the same key are expected and harmless.
    pub fn put_index_value(
        &self,
        effective_date: NaiveDate,
        value: &str,
    ) -> Result<(), StoreError> {
        let key = date_key(effective_date);
        let conn = self.conn.lock();

        let exists: Option<i64> = conn
            .query_row(
                "SELECT id FROM index_values WHERE date = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            debug!(date = %key, "index value already stored, keeping existing row");
            return Ok(());
        }

        conn.execute(
            "INSERT INTO index_values (date, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        debug!(date = %key, value = %value, "stored index value");
        Ok(())
    }

    /// Looks up a derived fraction pair for (effective date, rule flag).
    pub fn fractions(
        &self,
        effective_date: NaiveDate,
        under_rule: bool,
    ) -> Result<Option<(f64, f64)>, StoreError> {
        let conn = self.conn.lock();
        let pair = conn
            .query_row(
                "SELECT lat_fraction, lon_fraction FROM fractions
                 WHERE date = ?1 AND under_rule = ?2",
                params![date_key(effective_date), under_rule as i64],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(pair)
    }

    /// Stores a derived fraction pair, keeping any existing row for the key.
    pub fn put_fractions(
        &self,
        effective_date: NaiveDate,
        under_rule: bool,
        lat_fraction: f64,
        lon_fraction: f64,
    ) -> Result<(), StoreError> {
        let key = date_key(effective_date);
        let conn = self.conn.lock();

        let exists: Option<i64> = conn
            .query_row(
                "SELECT id FROM fractions WHERE date = ?1 AND under_rule = ?2",
                params![key, under_rule as i64],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            debug!(date = %key, under_rule, "fractions already stored, keeping existing row");
            return Ok(());
        }

        conn.execute(
            "INSERT INTO fractions (date, under_rule, lat_fraction, lon_fraction)
             VALUES (?1, ?2, ?3, ?4)",
            params![key, under_rule as i64, lat_fraction, lon_fraction],
        )?;
        debug!(date = %key, under_rule, "stored fraction pair");
        Ok(())
    }

    /// Prunes each table independently down to at most `max_rows` rows,
    /// deleting the lowest row ids first.
    pub fn prune(&self, max_rows: i64) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        for table in ["index_values", "fractions"] {
            let highest: Option<i64> = conn
                .query_row(
                    &format!("SELECT id FROM {table} ORDER BY id DESC LIMIT 1"),
                    [],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(highest) = highest {
                let deleted = conn.execute(
                    &format!("DELETE FROM {table} WHERE id <= ?1"),
                    params![highest - max_rows],
                )?;
                if deleted > 0 {
                    debug!(table, deleted, "pruned cache rows");
                }
            }
        }
        Ok(())
    }

    /// Unconditionally empties both tables. Returns whether it succeeded.
    pub fn wipe(&self) -> bool {
        let conn = self.conn.lock();
        match conn.execute_batch("DELETE FROM index_values; DELETE FROM fractions;") {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to wipe the derivation cache");
                false
            }
        }
    }

    /// Current row counts for (index values, fractions).
    pub fn row_counts(&self) -> Result<(i64, i64), StoreError> {
        let conn = self.conn.lock();
        let index_values =
            conn.query_row("SELECT COUNT(*) FROM index_values", [], |row| row.get(0))?;
        let fractions = conn.query_row("SELECT COUNT(*) FROM fractions", [], |row| row.get(0))?;
        Ok((index_values, fractions))
    }
}

/// The date key format shared by both tables: `YYYYMMDD`.
fn date_key(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn store() -> Store {
        Store::open_in_memory().unwrap()
    }

    #[test]
    fn test_index_value_round_trip() {
        let s = store();
        assert_eq!(s.index_value(date(2023, 6, 1)).unwrap(), None);

        s.put_index_value(date(2023, 6, 1), "34000.00").unwrap();
        assert_eq!(
            s.index_value(date(2023, 6, 1)).unwrap(),
            Some("34000.00".to_string())
        );
    }

    #[test]
    fn test_index_value_insert_is_idempotent() {
        let s = store();
        s.put_index_value(date(2023, 6, 1), "34000.00").unwrap();
        s.put_index_value(date(2023, 6, 1), "99999.99").unwrap();

        // The first write wins and no duplicate row appears.
        assert_eq!(
            s.index_value(date(2023, 6, 1)).unwrap(),
            Some("34000.00".to_string())
        );
        assert_eq!(s.row_counts().unwrap().0, 1);
    }

    #[test]
    fn test_fractions_keyed_by_rule_flag() {
        let s = store();
        s.put_fractions(date(2023, 6, 1), true, 0.1, 0.2).unwrap();
        s.put_fractions(date(2023, 6, 1), false, 0.3, 0.4).unwrap();

        assert_eq!(s.fractions(date(2023, 6, 1), true).unwrap(), Some((0.1, 0.2)));
        assert_eq!(s.fractions(date(2023, 6, 1), false).unwrap(), Some((0.3, 0.4)));
        assert_eq!(s.fractions(date(2023, 6, 2), true).unwrap(), None);
    }

    #[test]
    fn test_fractions_insert_is_idempotent() {
        let s = store();
        s.put_fractions(date(2023, 6, 1), true, 0.1, 0.2).unwrap();
        s.put_fractions(date(2023, 6, 1), true, 0.9, 0.9).unwrap();

        assert_eq!(s.fractions(date(2023, 6, 1), true).unwrap(), Some((0.1, 0.2)));
        assert_eq!(s.row_counts().unwrap().1, 1);
    }

    #[test]
    fn test_prune_keeps_newest_rows() {
        let s = store();
        // 20 inserts into a table capped at 15: the 5 oldest must go.
        for day in 1..=20 {
            s.put_index_value(date(2023, 6, day), &format!("{day}.00"))
                .unwrap();
        }
        s.prune(15).unwrap();

        assert_eq!(s.row_counts().unwrap().0, 15);
        for day in 1..=5 {
            assert_eq!(
                s.index_value(date(2023, 6, day)).unwrap(),
                None,
                "day {day} should have been pruned"
            );
        }
        for day in 6..=20 {
            assert!(
                s.index_value(date(2023, 6, day)).unwrap().is_some(),
                "day {day} should have survived"
            );
        }
    }

    #[test]
    fn test_prune_tables_independently() {
        let s = store();
        for day in 1..=10 {
            s.put_index_value(date(2023, 6, day), "1.00").unwrap();
        }
        s.put_fractions(date(2023, 6, 1), true, 0.1, 0.2).unwrap();
        s.prune(5).unwrap();

        let (values, fractions) = s.row_counts().unwrap();
        assert_eq!(values, 5);
        assert_eq!(fractions, 1, "the fractions table is under its own cap");
    }

    #[test]
    fn test_prune_under_capacity_is_a_no_op() {
        let s = store();
        s.put_index_value(date(2023, 6, 1), "1.00").unwrap();
        s.prune(15).unwrap();
        assert_eq!(s.row_counts().unwrap().0, 1);
    }

    #[test]
    fn test_prune_empty_store() {
        let s = store();
        assert!(s.prune(15).is_ok());
    }

    #[test]
    fn test_wipe_empties_both_tables() {
        let s = store();
        s.put_index_value(date(2023, 6, 1), "1.00").unwrap();
        s.put_fractions(date(2023, 6, 1), true, 0.1, 0.2).unwrap();

        assert!(s.wipe());
        assert_eq!(s.row_counts().unwrap(), (0, 0));
    }

    #[test]
    fn test_on_disk_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");

        {
            let s = Store::open(&path).unwrap();
            s.put_index_value(date(2023, 6, 1), "34000.00").unwrap();
        }

        let s = Store::open(&path).unwrap();
        assert_eq!(
            s.index_value(date(2023, 6, 1)).unwrap(),
            Some("34000.00".to_string())
        );
    }
}
