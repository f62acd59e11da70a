//! Durable record of committed days.
//!
//! The session reads its anchor price from a [`HistoryStore`] and hands each
//! finished day to it exactly once. Committed days are never mutated.

mod memory;

pub use memory::MemoryHistory;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::diary::DiaryEntry;
use crate::price::DailyCandle;

/// Snapshot of a finished day, independent of the live session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommittedDay {
    pub date: NaiveDate,
    pub entries: Vec<DiaryEntry>,
    pub candle: DailyCandle,
    pub committed_at: DateTime<Utc>,
}

/// One row of the history listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub candle: DailyCandle,
    pub entry_count: usize,
}

impl From<&CommittedDay> for DaySummary {
    fn from(day: &CommittedDay) -> Self {
        Self {
            date: day.date,
            candle: day.candle,
            entry_count: day.entries.len(),
        }
    }
}

/// Storage backend for committed days.
pub trait HistoryStore {
    /// Error type for store operations.
    type Error: std::fmt::Display;

    /// Latest committed date, `None` with no history.
    fn most_recent_day(&self) -> Result<Option<NaiveDate>, Self::Error>;

    /// Closing price of a committed day.
    fn closing_price_of(&self, day: NaiveDate) -> Result<Option<f64>, Self::Error>;

    /// Store a day atomically: either all of it is recorded or none of it.
    ///
    /// Rejects dates that are already committed.
    fn commit(&mut self, day: CommittedDay) -> Result<(), Self::Error>;

    /// Most recent days first, at most `limit` of them.
    fn list_days(&self, limit: usize) -> Result<Vec<DaySummary>, Self::Error>;

    /// Full record of a committed day.
    fn load_day(&self, day: NaiveDate) -> Result<Option<CommittedDay>, Self::Error>;

    /// Closing price of the most recent day, if any.
    fn latest_close(&self) -> Result<Option<f64>, Self::Error> {
        match self.most_recent_day()? {
            Some(day) => self.closing_price_of(day),
            None => Ok(None),
        }
    }
}

impl<H: HistoryStore + ?Sized> HistoryStore for &mut H {
    type Error = H::Error;

    fn most_recent_day(&self) -> Result<Option<NaiveDate>, Self::Error> {
        (**self).most_recent_day()
    }

    fn closing_price_of(&self, day: NaiveDate) -> Result<Option<f64>, Self::Error> {
        (**self).closing_price_of(day)
    }

    fn commit(&mut self, day: CommittedDay) -> Result<(), Self::Error> {
        (**self).commit(day)
    }

    fn list_days(&self, limit: usize) -> Result<Vec<DaySummary>, Self::Error> {
        (**self).list_days(limit)
    }

    fn load_day(&self, day: NaiveDate) -> Result<Option<CommittedDay>, Self::Error> {
        (**self).load_day(day)
    }
}
