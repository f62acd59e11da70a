//! Core error types for daymarket-core.
//!
//! This module defines the error hierarchy using thiserror. Session errors
//! are local and recoverable: the session stays valid after any of them.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Core error type for daymarket-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Session validation and hand-off errors
    #[error(transparent)]
    Session(#[from] SessionError),

    /// In-memory history store errors
    #[error("History error: {0}")]
    History(#[from] HistoryError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by the daily evaluation session.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    /// Proposed entry end is not after the window start.
    #[error("Invalid time range: end ({end}) must be after start ({start})")]
    InvalidTimeRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    /// Proposed entry end lies beyond what can be recorded yet.
    #[error("Entry end ({end}) is later than the allowed limit ({limit})")]
    EndBeyondLimit {
        end: NaiveDateTime,
        limit: NaiveDateTime,
    },

    /// Submit requested with no entries.
    #[error("No entries to submit")]
    EmptySubmission,

    /// A cancelled evaluation never becomes a diary entry.
    #[error("A cancelled entry cannot be recorded")]
    CancelledEntry,

    /// confirm-entry called without a staged window.
    #[error("No entry is staged; begin an entry first")]
    NothingStaged,

    /// The session changed after the submission was prepared.
    #[error("Submission is out of date; prepare it again")]
    StaleSubmission,

    /// Selected date outside the allowed range.
    #[error("Date {date} is outside the selectable range ({})", range_label(.earliest, .latest))]
    DateOutOfRange {
        date: NaiveDate,
        earliest: Option<NaiveDate>,
        latest: NaiveDate,
    },

    /// The history store rejected the day.
    #[error("Commit failed: {0}")]
    CommitFailed(String),

    /// The history store could not be read.
    #[error("History store unavailable: {0}")]
    HistoryUnavailable(String),
}

fn range_label(earliest: &Option<NaiveDate>, latest: &NaiveDate) -> String {
    match earliest {
        Some(e) => format!("{e} ..= {latest}"),
        None => format!("..= {latest}"),
    }
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Day already committed
    #[error("Day {0} is already committed")]
    DayExists(NaiveDate),

    /// Day precedes the most recent committed day
    #[error("Day {day} precedes the most recent committed day {latest}")]
    OutOfOrder { day: NaiveDate, latest: NaiveDate },

    /// Stored row could not be decoded
    #[error("Corrupt row in '{table}': {message}")]
    Corrupt { table: String, message: String },

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Errors from the in-memory history store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HistoryError {
    #[error("Day {0} is already committed")]
    DayExists(NaiveDate),

    #[error("Day {day} precedes the most recent committed day {latest}")]
    OutOfOrder { day: NaiveDate, latest: NaiveDate },

    #[error("Committed day has no entries")]
    Empty,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be resolved
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_out_of_range_message_includes_bounds() {
        let err = SessionError::DateOutOfRange {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            earliest: Some(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()),
            latest: NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "Date 2024-01-01 is outside the selectable range (2024-02-01 ..= 2024-02-10)"
        );
    }

    #[test]
    fn session_error_is_transparent_in_core_error() {
        let err: CoreError = SessionError::EmptySubmission.into();
        assert_eq!(err.to_string(), "No entries to submit");
    }

    #[test]
    fn locked_sqlite_error_maps_to_locked() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
            None,
        );
        assert!(matches!(DatabaseError::from(err), DatabaseError::Locked));
    }
}
