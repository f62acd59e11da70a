use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::diary::Evaluation;
use crate::price::DailyCandle;
use crate::session::SessionPhase;

/// Every session transition produces an Event.
/// Front ends turn them into confirmations (toasts, CLI output).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionReset {
        date: NaiveDate,
        previous_close: f64,
        at: DateTime<Utc>,
    },
    EntryStaged {
        start: NaiveDateTime,
        end: NaiveDateTime,
        elapsed_minutes: f64,
        at: DateTime<Utc>,
    },
    /// Staged window dropped without recording anything.
    EntryDiscarded {
        start: NaiveDateTime,
        end: NaiveDateTime,
        at: DateTime<Utc>,
    },
    EntryAdded {
        index: usize,
        eval: Evaluation,
        elapsed_minutes: f64,
        price: f64,
        at: DateTime<Utc>,
    },
    DaySubmitted {
        date: NaiveDate,
        candle: DailyCandle,
        entry_count: usize,
        next_date: NaiveDate,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: SessionPhase,
        date: NaiveDate,
        window_start: NaiveDateTime,
        window_end: NaiveDateTime,
        previous_close: f64,
        current_price: f64,
        entry_count: usize,
        at: DateTime<Utc>,
    },
}
