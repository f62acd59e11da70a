//! Diary entry and evaluation types.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Story text shown for entries the user left undescribed.
pub const DEFAULT_PLACEHOLDER_STORY: &str = "Describe what you did.";

/// How an activity affected the day.
///
/// `Cancel` is the "discard this entry" answer of the detail prompt and is
/// never stored in a [`DiaryEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Evaluation {
    Productive,
    Unproductive,
    Neutral,
    Cancel,
}

impl Evaluation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Evaluation::Productive => "productive",
            Evaluation::Unproductive => "unproductive",
            Evaluation::Neutral => "neutral",
            Evaluation::Cancel => "cancel",
        }
    }

    pub fn is_cancel(&self) -> bool {
        matches!(self, Evaluation::Cancel)
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEvaluationError(String);

impl fmt::Display for ParseEvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown evaluation '{}' (expected productive, unproductive, neutral or cancel)",
            self.0
        )
    }
}

impl std::error::Error for ParseEvaluationError {}

impl FromStr for Evaluation {
    type Err = ParseEvaluationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "productive" | "p" | "+" => Ok(Evaluation::Productive),
            "unproductive" | "u" | "-" => Ok(Evaluation::Unproductive),
            "neutral" | "n" | "0" => Ok(Evaluation::Neutral),
            "cancel" | "c" => Ok(Evaluation::Cancel),
            _ => Err(ParseEvaluationError(s.to_string())),
        }
    }
}

/// One timed, rated activity over the half-open interval `[start_time, end_time)`.
///
/// Immutable once built. The story is `None` when the user left it unset;
/// use [`DiaryEntry::display_story`] to render it with a placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiaryEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    story: Option<String>,
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
    eval: Evaluation,
}

impl DiaryEntry {
    /// Build an entry, rejecting empty or negative intervals and `Cancel`.
    ///
    /// Blank stories are stored as unset.
    pub fn new(
        story: Option<String>,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
        eval: Evaluation,
    ) -> Result<Self, SessionError> {
        if end_time <= start_time {
            return Err(SessionError::InvalidTimeRange {
                start: start_time,
                end: end_time,
            });
        }
        if eval.is_cancel() {
            return Err(SessionError::CancelledEntry);
        }
        let story = story
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Ok(Self {
            story,
            start_time,
            end_time,
            eval,
        })
    }

    pub fn story(&self) -> Option<&str> {
        self.story.as_deref()
    }

    /// The story, or `placeholder` when none was given.
    pub fn display_story<'a>(&'a self, placeholder: &'a str) -> &'a str {
        self.story.as_deref().unwrap_or(placeholder)
    }

    pub fn start_time(&self) -> NaiveDateTime {
        self.start_time
    }

    pub fn end_time(&self) -> NaiveDateTime {
        self.end_time
    }

    pub fn eval(&self) -> Evaluation {
        self.eval
    }

    /// Fractional minutes covered by the entry.
    pub fn elapsed_minutes(&self) -> f64 {
        elapsed_minutes(self.start_time, self.end_time)
    }
}

/// Fractional minutes between two timestamps.
pub(crate) fn elapsed_minutes(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    (end - start).num_milliseconds() as f64 / 60_000.0
}
