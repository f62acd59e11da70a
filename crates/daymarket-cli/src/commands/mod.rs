pub mod completions;
pub mod config;
pub mod day;
pub mod entry;
pub mod history;

use chrono::{Local, NaiveDate, NaiveDateTime};
use daymarket_core::{Config, Database, SessionController};
use tracing::warn;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub type Session = SessionController<Database>;

/// Local wall-clock time.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub fn parse_date(raw: &str) -> CliResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{raw}', expected YYYY-MM-DD").into())
}

/// Resume the parked session, or start on the first uncommitted day.
pub fn open_session() -> CliResult<Session> {
    let config = Config::load()?;
    let db = Database::open()?;
    let settings = config.session_settings();

    let parked = match db.load_session() {
        Ok(parked) => parked,
        Err(e) => {
            warn!(error = %e, "discarding unreadable parked session");
            db.clear_session()?;
            None
        }
    };

    Ok(SessionController::restore(db, settings, parked, now())?)
}

pub fn park_session(session: &Session) -> CliResult {
    session.history().save_session(&session.parked_state())?;
    Ok(())
}
