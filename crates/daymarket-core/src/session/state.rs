use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::diary::DiaryEntry;

/// Working set of the day being logged.
///
/// `entries` and `prices` are parallel: `prices[i]` is the price right after
/// `entries[i]`. Only the session controller mutates it.
///
/// Equality ignores `revision`: two states are equal when every observable
/// field matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    selected_date: NaiveDate,
    window_start: NaiveDateTime,
    window_end: NaiveDateTime,
    entries: Vec<DiaryEntry>,
    prices: Vec<f64>,
    previous_close: f64,
    current_price: f64,
    /// Bumped on every mutation.
    #[serde(default)]
    revision: u64,
}

impl PartialEq for SessionState {
    fn eq(&self, other: &Self) -> bool {
        self.selected_date == other.selected_date
            && self.window_start == other.window_start
            && self.window_end == other.window_end
            && self.entries == other.entries
            && self.prices == other.prices
            && self.previous_close == other.previous_close
            && self.current_price == other.current_price
    }
}

impl SessionState {
    /// Fresh state for `date`, anchored at `previous_close`.
    pub fn new(date: NaiveDate, previous_close: f64) -> Self {
        let midnight = midnight(date);
        Self {
            selected_date: date,
            window_start: midnight,
            window_end: midnight,
            entries: Vec::new(),
            prices: Vec::new(),
            previous_close,
            current_price: previous_close,
            revision: 0,
        }
    }

    pub fn selected_date(&self) -> NaiveDate {
        self.selected_date
    }

    pub fn window_start(&self) -> NaiveDateTime {
        self.window_start
    }

    pub fn window_end(&self) -> NaiveDateTime {
        self.window_end
    }

    pub fn entries(&self) -> &[DiaryEntry] {
        &self.entries
    }

    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    pub fn previous_close(&self) -> f64 {
        self.previous_close
    }

    pub fn current_price(&self) -> f64 {
        self.current_price
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// False when the parallel lists disagree or the window runs backwards.
    pub fn is_consistent(&self) -> bool {
        self.entries.len() == self.prices.len()
            && self.window_start <= self.window_end
            && self.prices.last().map_or(true, |&p| p == self.current_price)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Latest moment an entry of this day may end, given the current time.
    pub fn window_limit(&self, now: NaiveDateTime) -> NaiveDateTime {
        now.min(end_of_day(self.selected_date))
    }

    pub(crate) fn reset(&mut self, date: NaiveDate, previous_close: f64) {
        let revision = self.revision + 1;
        *self = Self::new(date, previous_close);
        self.revision = revision;
    }

    pub(crate) fn set_window_end(&mut self, end: NaiveDateTime) {
        self.window_end = end;
        self.revision += 1;
    }

    pub(crate) fn collapse_window(&mut self) {
        self.window_end = self.window_start;
        self.revision += 1;
    }

    /// Append an entry and its price and move the window past it.
    pub(crate) fn push(&mut self, entry: DiaryEntry, price: f64) {
        let end = entry.end_time();
        self.entries.push(entry);
        self.prices.push(price);
        self.current_price = price;
        self.window_start = end;
        self.window_end = end;
        self.revision += 1;
    }
}

pub fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Midnight of the following day.
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.checked_add_days(Days::new(1))
        .map(midnight)
        .unwrap_or(NaiveDateTime::MAX)
}
