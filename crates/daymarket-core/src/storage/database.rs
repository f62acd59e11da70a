//! SQLite-based history storage.
//!
//! Provides persistent storage for:
//! - Committed days (candle plus diary entries), written once
//! - Key-value store for application state (the parked session)

use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::{data_dir, migrations};
use crate::diary::{DiaryEntry, Evaluation};
use crate::error::{DatabaseError, Result};
use crate::history::{CommittedDay, DaySummary, HistoryStore};
use crate::price::DailyCandle;
use crate::session::SessionState;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const SESSION_KEY: &str = "session_state";

/// SQLite database holding the committed history.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data dir>/history.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("history.db");
        Ok(Self::open_at(&path)?)
    }

    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database (for tests and dry runs).
    pub fn open_memory() -> Result<Self, DatabaseError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, DatabaseError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), DatabaseError> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// The parked in-progress session, if one was saved.
    ///
    /// # Errors
    /// Returns `DatabaseError::Corrupt` when the stored state does not hold
    /// together, for example entries without matching prices.
    pub fn load_session(&self) -> Result<Option<SessionState>> {
        let Some(json) = self.kv_get(SESSION_KEY)? else {
            return Ok(None);
        };
        let state: SessionState = serde_json::from_str(&json)?;
        if !state.is_consistent() {
            return Err(DatabaseError::Corrupt {
                table: "kv".into(),
                message: format!(
                    "parked session has {} entries and {} prices",
                    state.entries().len(),
                    state.prices().len()
                ),
            }
            .into());
        }
        Ok(Some(state))
    }

    pub fn save_session(&self, state: &SessionState) -> Result<()> {
        let json = serde_json::to_string(state)?;
        self.kv_set(SESSION_KEY, &json)?;
        Ok(())
    }

    pub fn clear_session(&self) -> Result<(), DatabaseError> {
        self.kv_delete(SESSION_KEY)
    }

    fn day_exists(&self, day: NaiveDate) -> Result<bool, DatabaseError> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM days WHERE date = ?1",
                params![day.format(DATE_FORMAT).to_string()],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn load_entries(&self, day: NaiveDate) -> Result<Vec<DiaryEntry>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT story, start_time, end_time, eval
             FROM entries
             WHERE day = ?1
             ORDER BY position",
        )?;
        let rows = stmt.query_map(params![day.format(DATE_FORMAT).to_string()], |row| {
            Ok((
                row.get::<_, Option<String>>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (story, start, end, eval) = row?;
            let eval: Evaluation = eval.parse().map_err(|e: crate::diary::ParseEvaluationError| {
                corrupt("entries", e.to_string())
            })?;
            let entry = DiaryEntry::new(story, parse_time(&start)?, parse_time(&end)?, eval)
                .map_err(|e| corrupt("entries", e.to_string()))?;
            entries.push(entry);
        }
        Ok(entries)
    }
}

impl HistoryStore for Database {
    type Error = DatabaseError;

    fn most_recent_day(&self) -> Result<Option<NaiveDate>, DatabaseError> {
        let latest: Option<String> = self
            .conn
            .query_row("SELECT MAX(date) FROM days", [], |row| row.get(0))?;
        latest.as_deref().map(parse_date).transpose()
    }

    fn closing_price_of(&self, day: NaiveDate) -> Result<Option<f64>, DatabaseError> {
        let close = self
            .conn
            .query_row(
                "SELECT close FROM days WHERE date = ?1",
                params![day.format(DATE_FORMAT).to_string()],
                |row| row.get::<_, f64>(0),
            )
            .optional()?;
        Ok(close)
    }

    /// Writes the day row and all entries in one transaction.
    fn commit(&mut self, day: CommittedDay) -> Result<(), DatabaseError> {
        if day.entries.is_empty() {
            return Err(corrupt("entries", "committed day has no entries".into()));
        }
        if self.day_exists(day.date)? {
            return Err(DatabaseError::DayExists(day.date));
        }
        if let Some(latest) = self.most_recent_day()? {
            if day.date < latest {
                return Err(DatabaseError::OutOfOrder {
                    day: day.date,
                    latest,
                });
            }
        }

        let date = day.date.format(DATE_FORMAT).to_string();
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO days (date, open, high, low, close, committed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                date,
                day.candle.open,
                day.candle.high,
                day.candle.low,
                day.candle.close,
                day.committed_at.to_rfc3339(),
            ],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO entries (day, position, story, start_time, end_time, eval)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (position, entry) in day.entries.iter().enumerate() {
                stmt.execute(params![
                    date,
                    position as i64,
                    entry.story(),
                    entry.start_time().format(TIME_FORMAT).to_string(),
                    entry.end_time().format(TIME_FORMAT).to_string(),
                    entry.eval().as_str(),
                ])?;
            }
        }
        tx.commit()?;
        debug!(%date, entries = day.entries.len(), "day committed");
        Ok(())
    }

    fn list_days(&self, limit: usize) -> Result<Vec<DaySummary>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT d.date, d.open, d.high, d.low, d.close, COUNT(e.id)
             FROM days d
             LEFT JOIN entries e ON e.day = d.date
             GROUP BY d.date
             ORDER BY d.date DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                DailyCandle {
                    open: row.get(1)?,
                    high: row.get(2)?,
                    low: row.get(3)?,
                    close: row.get(4)?,
                },
                row.get::<_, i64>(5)?,
            ))
        })?;

        let mut days = Vec::new();
        for row in rows {
            let (date, candle, count) = row?;
            days.push(DaySummary {
                date: parse_date(&date)?,
                candle,
                entry_count: count as usize,
            });
        }
        Ok(days)
    }

    fn load_day(&self, day: NaiveDate) -> Result<Option<CommittedDay>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT open, high, low, close, committed_at FROM days WHERE date = ?1",
                params![day.format(DATE_FORMAT).to_string()],
                |row| {
                    Ok((
                        DailyCandle {
                            open: row.get(0)?,
                            high: row.get(1)?,
                            low: row.get(2)?,
                            close: row.get(3)?,
                        },
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((candle, committed_at)) = row else {
            return Ok(None);
        };
        let committed_at = DateTime::parse_from_rfc3339(&committed_at)
            .map_err(|e| corrupt("days", e.to_string()))?
            .with_timezone(&Utc);
        Ok(Some(CommittedDay {
            date: day,
            entries: self.load_entries(day)?,
            candle,
            committed_at,
        }))
    }
}

fn corrupt(table: &str, message: String) -> DatabaseError {
    DatabaseError::Corrupt {
        table: table.to_string(),
        message,
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| corrupt("days", format!("{s}: {e}")))
}

fn parse_time(s: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(s, TIME_FORMAT)
        .map_err(|e| corrupt("entries", format!("{s}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn committed(d: u32, stories: &[Option<&str>], prices: &[f64]) -> CommittedDay {
        let date = NaiveDate::from_ymd_opt(2024, 7, d).unwrap();
        let entries = stories
            .iter()
            .enumerate()
            .map(|(i, story)| {
                let start = date.and_hms_opt(i as u32, 0, 0).unwrap();
                let end = date.and_hms_opt(i as u32 + 1, 0, 0).unwrap();
                DiaryEntry::new(story.map(String::from), start, end, Evaluation::Productive)
                    .unwrap()
            })
            .collect();
        CommittedDay {
            date,
            entries,
            candle: DailyCandle::from_prices(prices).unwrap(),
            committed_at: Utc::now(),
        }
    }

    #[test]
    fn empty_database_has_no_history() {
        let db = Database::open_memory().unwrap();
        assert_eq!(db.most_recent_day().unwrap(), None);
        assert_eq!(db.latest_close().unwrap(), None);
        assert!(db.list_days(10).unwrap().is_empty());
    }

    #[test]
    fn commit_and_load_round_trip() {
        let mut db = Database::open_memory().unwrap();
        let day = committed(1, &[Some("Write report"), None], &[1024.0, 1048.0]);
        db.commit(day.clone()).unwrap();

        let loaded = db.load_day(day.date).unwrap().unwrap();
        assert_eq!(loaded.entries, day.entries);
        assert_eq!(loaded.candle, day.candle);
        assert_eq!(loaded.entries[1].story(), None);
        assert_eq!(db.most_recent_day().unwrap(), Some(day.date));
        assert_eq!(db.latest_close().unwrap(), Some(1048.0));
    }

    #[test]
    fn committed_day_cannot_be_rewritten() {
        let mut db = Database::open_memory().unwrap();
        db.commit(committed(2, &[None], &[1010.0])).unwrap();
        let err = db.commit(committed(2, &[None, None], &[900.0, 800.0])).unwrap_err();
        assert!(matches!(err, DatabaseError::DayExists(_)));

        let loaded = db.load_day(NaiveDate::from_ymd_opt(2024, 7, 2).unwrap()).unwrap().unwrap();
        assert_eq!(loaded.entries.len(), 1);
        assert_eq!(loaded.candle.close, 1010.0);
    }

    #[test]
    fn out_of_order_day_is_rejected() {
        let mut db = Database::open_memory().unwrap();
        db.commit(committed(5, &[None], &[1000.0])).unwrap();
        let err = db.commit(committed(4, &[None], &[1000.0])).unwrap_err();
        assert!(matches!(err, DatabaseError::OutOfOrder { .. }));
    }

    #[test]
    fn list_days_counts_entries_newest_first() {
        let mut db = Database::open_memory().unwrap();
        db.commit(committed(1, &[None], &[1000.0])).unwrap();
        db.commit(committed(3, &[None, None, None], &[1001.0, 999.0, 1003.0])).unwrap();
        let days = db.list_days(5).unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 7, 3).unwrap());
        assert_eq!(days[0].entry_count, 3);
        assert_eq!(days[0].candle.low, 999.0);
        assert_eq!(days[1].entry_count, 1);
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().as_deref(), Some("hello"));
        db.kv_delete("test").unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
    }

    #[test]
    fn session_state_parks_in_kv() {
        let db = Database::open_memory().unwrap();
        assert!(db.load_session().unwrap().is_none());
        let state = SessionState::new(NaiveDate::from_ymd_opt(2024, 7, 9).unwrap(), 1200.0);
        db.save_session(&state).unwrap();
        assert_eq!(db.load_session().unwrap(), Some(state));
        db.clear_session().unwrap();
        assert!(db.load_session().unwrap().is_none());
    }

    #[test]
    fn parked_session_with_mismatched_lists_is_corrupt() {
        let db = Database::open_memory().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 7, 9).unwrap();
        let mut state = SessionState::new(date, 1000.0);
        let end = date.and_hms_opt(1, 0, 0).unwrap();
        let entry = DiaryEntry::new(None, state.window_start(), end, Evaluation::Productive).unwrap();
        state.push(entry, 1024.0);

        let mut json = serde_json::to_value(&state).unwrap();
        json["prices"] = serde_json::json!([]);
        db.kv_set(SESSION_KEY, &json.to_string()).unwrap();

        let err = db.load_session().unwrap_err();
        assert!(matches!(
            err,
            crate::error::CoreError::Database(DatabaseError::Corrupt { .. })
        ));
    }

    #[test]
    fn open_at_persists_between_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.db");
        {
            let mut db = Database::open_at(&path).unwrap();
            db.commit(committed(8, &[Some("Run")], &[1020.0])).unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.latest_close().unwrap(), Some(1020.0));
    }
}
