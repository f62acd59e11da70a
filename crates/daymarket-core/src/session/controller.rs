//! Session controller: the only writer of a [`SessionState`].
//!
//! Every mutating operation takes `&mut self`, so operations on one session
//! are serialized. Staging is transient: any reset drops it, and
//! [`SessionController::parked_state`] never carries it.

use chrono::{Days, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::state::SessionState;
use super::SessionSettings;
use crate::diary::{elapsed_minutes, DiaryEntry, Evaluation};
use crate::error::SessionError;
use crate::events::Event;
use crate::history::{CommittedDay, HistoryStore};
use crate::price::DailyCandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Idle,
    /// A time window is staged and waits for its story and evaluation.
    Staging,
}

/// Window proposed by `begin_entry`, waiting for `confirm_entry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedEntry {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl StagedEntry {
    pub fn elapsed_minutes(&self) -> f64 {
        elapsed_minutes(self.start, self.end)
    }
}

/// Selectable date range for the date picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateBounds {
    /// Most recent committed day, `None` without history.
    pub earliest: Option<NaiveDate>,
    pub latest: NaiveDate,
}

impl DateBounds {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.earliest.map_or(true, |e| date >= e) && date <= self.latest
    }
}

/// A day ready to be committed, awaiting the user's final confirmation.
///
/// Holds its own copy of the entries, so later session changes cannot alter
/// it. Submitting it after the session changed fails with
/// [`SessionError::StaleSubmission`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    day: CommittedDay,
    revision: u64,
}

impl Submission {
    pub fn date(&self) -> NaiveDate {
        self.day.date
    }

    pub fn candle(&self) -> &DailyCandle {
        &self.day.candle
    }

    pub fn entries(&self) -> &[DiaryEntry] {
        &self.day.entries
    }
}

/// Drives one daily evaluation session against a history store.
pub struct SessionController<H: HistoryStore> {
    state: SessionState,
    staged: Option<StagedEntry>,
    history: H,
    settings: SessionSettings,
}

impl<H: HistoryStore> SessionController<H> {
    /// Start a fresh session on `date`, anchored at the latest committed close.
    pub fn new(history: H, settings: SessionSettings, date: NaiveDate) -> Result<Self, SessionError> {
        let mut controller = Self {
            state: SessionState::new(date, settings.default_anchor),
            staged: None,
            history,
            settings,
        };
        controller.reset_for_date(date)?;
        Ok(controller)
    }

    /// Start on the first day not yet committed.
    ///
    /// Without history this is the latest selectable day. When the most recent
    /// committed day is already the latest one, the session opens on the day
    /// after it and reports itself caught up.
    pub fn start(history: H, settings: SessionSettings, now: NaiveDateTime) -> Result<Self, SessionError> {
        let mut controller = Self {
            state: SessionState::new(now.date(), settings.default_anchor),
            staged: None,
            history,
            settings,
        };
        let bounds = controller.date_bounds(now)?;
        let date = match bounds.earliest {
            Some(last) => last.succ_opt().ok_or(SessionError::DateOutOfRange {
                date: last,
                earliest: bounds.earliest,
                latest: bounds.latest,
            })?,
            None => bounds.latest,
        };
        controller.reset_for_date(date)?;
        Ok(controller)
    }

    /// Continue a previously parked session.
    pub fn resume(history: H, settings: SessionSettings, state: SessionState) -> Self {
        let mut state = state;
        state.collapse_window();
        Self {
            state,
            staged: None,
            history,
            settings,
        }
    }

    /// Resume `parked` unless its date has been committed since it was parked,
    /// in which case start over on the first uncommitted day.
    pub fn restore(
        history: H,
        settings: SessionSettings,
        parked: Option<SessionState>,
        now: NaiveDateTime,
    ) -> Result<Self, SessionError> {
        let Some(state) = parked else {
            return Self::start(history, settings, now);
        };
        let last = history
            .most_recent_day()
            .map_err(|e| SessionError::HistoryUnavailable(e.to_string()))?;
        match last {
            Some(last) if state.selected_date() <= last => {
                warn!(date = %state.selected_date(), %last, "parked session is already committed");
                Self::start(history, settings, now)
            }
            _ => Ok(Self::resume(history, settings, state)),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn staged(&self) -> Option<&StagedEntry> {
        self.staged.as_ref()
    }

    pub fn phase(&self) -> SessionPhase {
        if self.staged.is_some() {
            SessionPhase::Staging
        } else {
            SessionPhase::Idle
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    /// Session state with any staged window dropped, safe to persist.
    pub fn parked_state(&self) -> SessionState {
        let mut state = self.state.clone();
        state.collapse_window();
        state
    }

    pub fn into_parts(self) -> (SessionState, H) {
        let state = self.parked_state();
        (state, self.history)
    }

    /// Latest moment a new entry may end.
    pub fn window_limit(&self, now: NaiveDateTime) -> NaiveDateTime {
        self.state.window_limit(now)
    }

    /// Dates the caller may pass to `reset_for_date`.
    pub fn date_bounds(&self, now: NaiveDateTime) -> Result<DateBounds, SessionError> {
        let earliest = self
            .history
            .most_recent_day()
            .map_err(|e| SessionError::HistoryUnavailable(e.to_string()))?;
        let today = now.date();
        let latest = if self.settings.include_today {
            today
        } else {
            today.pred_opt().unwrap_or(today)
        };
        Ok(DateBounds { earliest, latest })
    }

    /// True once the selected date is past the last loggable day.
    pub fn is_caught_up(&self, now: NaiveDateTime) -> bool {
        match self.date_bounds(now) {
            Ok(bounds) => self.state.selected_date() > bounds.latest,
            Err(_) => self.state.selected_date() > now.date(),
        }
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            phase: self.phase(),
            date: self.state.selected_date(),
            window_start: self.state.window_start(),
            window_end: self.state.window_end(),
            previous_close: self.state.previous_close(),
            current_price: self.state.current_price(),
            entry_count: self.state.entries().len(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start over on `date`. The caller is responsible for range checks.
    pub fn reset_for_date(&mut self, date: NaiveDate) -> Result<Event, SessionError> {
        let anchor = self.anchor()?;
        self.staged = None;
        self.state.reset(date, anchor);
        info!(%date, previous_close = anchor, "session reset");
        Ok(Event::SessionReset {
            date,
            previous_close: anchor,
            at: Utc::now(),
        })
    }

    /// Range-checked `reset_for_date`.
    pub fn select_date(&mut self, date: NaiveDate, now: NaiveDateTime) -> Result<Event, SessionError> {
        let bounds = self.date_bounds(now)?;
        if !bounds.contains(date) {
            return Err(SessionError::DateOutOfRange {
                date,
                earliest: bounds.earliest,
                latest: bounds.latest,
            });
        }
        self.reset_for_date(date)
    }

    /// Stage `[window_start, proposed_end)` for the next entry.
    pub fn begin_entry(
        &mut self,
        proposed_end: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Result<Event, SessionError> {
        let start = self.state.window_start();
        if proposed_end <= start {
            return Err(SessionError::InvalidTimeRange {
                start,
                end: proposed_end,
            });
        }
        let limit = self.window_limit(now);
        if proposed_end > limit {
            return Err(SessionError::EndBeyondLimit {
                end: proposed_end,
                limit,
            });
        }

        let staged = StagedEntry {
            start,
            end: proposed_end,
        };
        self.staged = Some(staged);
        self.state.set_window_end(proposed_end);
        debug!(%start, end = %proposed_end, "entry staged");
        Ok(Event::EntryStaged {
            start,
            end: proposed_end,
            elapsed_minutes: staged.elapsed_minutes(),
            at: Utc::now(),
        })
    }

    /// Finish the staged entry. `Cancel` discards it.
    pub fn confirm_entry(
        &mut self,
        story: Option<String>,
        eval: Evaluation,
    ) -> Result<Event, SessionError> {
        let staged = self.staged.ok_or(SessionError::NothingStaged)?;
        let minutes = staged.elapsed_minutes();
        let Some(price) = self.settings.model.evolve(
            self.state.previous_close(),
            self.state.current_price(),
            minutes,
            eval,
        ) else {
            self.staged = None;
            return Ok(self.discard_staged(staged));
        };
        let story = story.filter(|s| s.trim() != self.settings.placeholder_story.trim());
        let entry = DiaryEntry::new(story, staged.start, staged.end, eval)?;

        self.staged = None;
        self.state.push(entry, price);
        let index = self.state.entries().len() - 1;
        info!(index, %eval, minutes, price, "entry added");
        Ok(Event::EntryAdded {
            index,
            eval,
            elapsed_minutes: minutes,
            price,
            at: Utc::now(),
        })
    }

    /// Drop the staged window, if any.
    pub fn cancel_staged(&mut self) -> Option<Event> {
        let staged = self.staged.take()?;
        Some(self.discard_staged(staged))
    }

    /// Snapshot the day for the final confirmation prompt.
    pub fn prepare_submission(&self) -> Result<Submission, SessionError> {
        let candle =
            DailyCandle::from_prices(self.state.prices()).ok_or(SessionError::EmptySubmission)?;
        Ok(Submission {
            day: CommittedDay {
                date: self.state.selected_date(),
                entries: self.state.entries().to_vec(),
                candle,
                committed_at: Utc::now(),
            },
            revision: self.state.revision(),
        })
    }

    /// Commit a confirmed submission and advance to the next date.
    ///
    /// On any failure the session keeps its entries and prices.
    pub fn submit(&mut self, submission: Submission) -> Result<Event, SessionError> {
        if self.is_stale(&submission) {
            return Err(SessionError::StaleSubmission);
        }
        let date = submission.day.date;
        let next_date = date
            .checked_add_days(Days::new(1))
            .ok_or(SessionError::DateOutOfRange {
                date,
                earliest: None,
                latest: date,
            })?;
        let candle = submission.day.candle;
        let entry_count = submission.day.entries.len();

        let mut day = submission.day;
        day.committed_at = Utc::now();
        if let Err(e) = self.history.commit(day) {
            warn!(%date, error = %e, "history store rejected day");
            return Err(SessionError::CommitFailed(e.to_string()));
        }
        info!(%date, close = candle.close, entry_count, "day submitted");

        let anchor = match self.anchor() {
            Ok(anchor) => anchor,
            Err(e) => {
                warn!(error = %e, "falling back to submitted close as anchor");
                candle.close
            }
        };
        self.staged = None;
        self.state.reset(next_date, anchor);
        Ok(Event::DaySubmitted {
            date,
            candle,
            entry_count,
            next_date,
            at: Utc::now(),
        })
    }

    /// Throw away unsaved entries of the selected date.
    pub fn discard_session(&mut self) -> Result<Event, SessionError> {
        let date = self.state.selected_date();
        self.reset_for_date(date)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn anchor(&self) -> Result<f64, SessionError> {
        let close = self
            .history
            .latest_close()
            .map_err(|e| SessionError::HistoryUnavailable(e.to_string()))?;
        Ok(close.unwrap_or(self.settings.default_anchor))
    }

    fn is_stale(&self, submission: &Submission) -> bool {
        submission.revision != self.state.revision()
            || submission.day.date != self.state.selected_date()
    }

    fn discard_staged(&mut self, staged: StagedEntry) -> Event {
        self.state.collapse_window();
        debug!(start = %staged.start, end = %staged.end, "staged entry discarded");
        Event::EntryDiscarded {
            start: staged.start,
            end: staged.end,
            at: Utc::now(),
        }
    }
}
