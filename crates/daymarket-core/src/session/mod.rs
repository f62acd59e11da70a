//! Daily evaluation session.
//!
//! The session owns the in-progress diary and price series of one calendar
//! day. Entries are recorded back to back from midnight: each one starts
//! where the previous one ended. Submitting hands the day to a
//! [`HistoryStore`](crate::history::HistoryStore) and moves on to the next
//! date.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --begin_entry--> Staging --confirm_entry--> Idle
//! Idle --prepare_submission + submit--> Idle (next date)
//! ```

mod controller;
mod state;

pub use controller::{DateBounds, SessionController, SessionPhase, StagedEntry, Submission};
pub use state::{end_of_day, midnight, SessionState};

use serde::{Deserialize, Serialize};

use crate::diary::DEFAULT_PLACEHOLDER_STORY;
use crate::price::{PriceModel, DEFAULT_ANCHOR_PRICE};

/// Tunables of a session, usually taken from [`Config`](crate::Config).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    pub model: PriceModel,
    /// Anchor price when no day has been committed yet.
    pub default_anchor: f64,
    /// Whether today itself may be selected and logged.
    pub include_today: bool,
    /// Placeholder story; a story equal to it counts as unset.
    pub placeholder_story: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            model: PriceModel::default(),
            default_anchor: DEFAULT_ANCHOR_PRICE,
            include_today: true,
            placeholder_story: DEFAULT_PLACEHOLDER_STORY.to_string(),
        }
    }
}
