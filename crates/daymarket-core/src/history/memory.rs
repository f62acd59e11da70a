use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::{CommittedDay, DaySummary, HistoryStore};
use crate::error::HistoryError;

/// In-process history, ordered by date.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    days: BTreeMap<NaiveDate, CommittedDay>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

impl HistoryStore for MemoryHistory {
    type Error = HistoryError;

    fn most_recent_day(&self) -> Result<Option<NaiveDate>, Self::Error> {
        Ok(self.days.keys().next_back().copied())
    }

    fn closing_price_of(&self, day: NaiveDate) -> Result<Option<f64>, Self::Error> {
        Ok(self.days.get(&day).map(|d| d.candle.close))
    }

    fn commit(&mut self, day: CommittedDay) -> Result<(), Self::Error> {
        if day.entries.is_empty() {
            return Err(HistoryError::Empty);
        }
        if self.days.contains_key(&day.date) {
            return Err(HistoryError::DayExists(day.date));
        }
        if let Some(latest) = self.most_recent_day()? {
            if day.date < latest {
                return Err(HistoryError::OutOfOrder {
                    day: day.date,
                    latest,
                });
            }
        }
        self.days.insert(day.date, day);
        Ok(())
    }

    fn list_days(&self, limit: usize) -> Result<Vec<DaySummary>, Self::Error> {
        Ok(self
            .days
            .values()
            .rev()
            .take(limit)
            .map(DaySummary::from)
            .collect())
    }

    fn load_day(&self, day: NaiveDate) -> Result<Option<CommittedDay>, Self::Error> {
        Ok(self.days.get(&day).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diary::{DiaryEntry, Evaluation};
    use crate::price::DailyCandle;
    use chrono::Utc;

    fn day(d: u32, close: f64) -> CommittedDay {
        let date = NaiveDate::from_ymd_opt(2024, 5, d).unwrap();
        let start = date.and_hms_opt(0, 0, 0).unwrap();
        let end = date.and_hms_opt(8, 0, 0).unwrap();
        CommittedDay {
            date,
            entries: vec![DiaryEntry::new(None, start, end, Evaluation::Neutral).unwrap()],
            candle: DailyCandle::from_prices(&[close]).unwrap(),
            committed_at: Utc::now(),
        }
    }

    #[test]
    fn empty_history_has_no_anchor() {
        let history = MemoryHistory::new();
        assert_eq!(history.most_recent_day().unwrap(), None);
        assert_eq!(history.latest_close().unwrap(), None);
    }

    #[test]
    fn latest_close_follows_most_recent_day() {
        let mut history = MemoryHistory::new();
        history.commit(day(1, 1010.0)).unwrap();
        history.commit(day(2, 990.0)).unwrap();
        assert_eq!(
            history.most_recent_day().unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 2)
        );
        assert_eq!(history.latest_close().unwrap(), Some(990.0));
    }

    #[test]
    fn rejects_duplicate_and_out_of_order_days() {
        let mut history = MemoryHistory::new();
        history.commit(day(3, 1000.0)).unwrap();
        assert!(matches!(
            history.commit(day(3, 1100.0)),
            Err(HistoryError::DayExists(_))
        ));
        assert!(matches!(
            history.commit(day(2, 1100.0)),
            Err(HistoryError::OutOfOrder { .. })
        ));
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest_close().unwrap(), Some(1000.0));
    }

    #[test]
    fn list_days_is_newest_first() {
        let mut history = MemoryHistory::new();
        for d in 1..=4 {
            history.commit(day(d, 1000.0 + d as f64)).unwrap();
        }
        let listed = history.list_days(2).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].date, NaiveDate::from_ymd_opt(2024, 5, 4).unwrap());
        assert_eq!(listed[1].date, NaiveDate::from_ymd_opt(2024, 5, 3).unwrap());
    }
}
