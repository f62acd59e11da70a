//! Diary entries: one logged, timed, rated activity each.

mod entry;

pub(crate) use entry::elapsed_minutes;
pub use entry::{DiaryEntry, Evaluation, ParseEvaluationError, DEFAULT_PLACEHOLDER_STORY};
