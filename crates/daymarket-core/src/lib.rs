//! # Daymarket Core Library
//!
//! This library provides the core logic of Daymarket: a day is logged as a
//! sequence of timed, rated activities and turned into a synthetic price
//! series, committed once per day as a candle and never changed afterwards.
//! The `daymarket` CLI is a thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Session**: the daily evaluation state machine (stage, confirm, submit)
//! - **Price**: price evolution and daily candles
//! - **History**: the committed-day store seam, in memory or SQLite
//! - **Storage**: SQLite history database and TOML configuration
//!
//! ## Key Components
//!
//! - [`SessionController`]: daily evaluation state machine
//! - [`HistoryStore`]: trait for committed-day storage
//! - [`Database`]: SQLite history store
//! - [`Config`]: application configuration management

pub mod diary;
pub mod error;
pub mod events;
pub mod history;
pub mod price;
pub mod session;
pub mod storage;

pub use diary::{DiaryEntry, Evaluation};
pub use error::{ConfigError, CoreError, DatabaseError, HistoryError, Result, SessionError};
pub use events::Event;
pub use history::{CommittedDay, DaySummary, HistoryStore, MemoryHistory};
pub use price::{evolve, DailyCandle, PriceModel};
pub use session::{
    DateBounds, SessionController, SessionPhase, SessionSettings, SessionState, StagedEntry,
    Submission,
};
pub use storage::{Config, Database};
