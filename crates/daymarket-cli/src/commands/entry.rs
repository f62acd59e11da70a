use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::Subcommand;
use daymarket_core::session::end_of_day;
use daymarket_core::Evaluation;

use super::{now, open_session, park_session, CliResult};

#[derive(Subcommand)]
pub enum EntryAction {
    /// Log the next activity, from the end of the previous one up to --end
    Add {
        /// End time: HH:MM on the selected date, 24:00, or YYYY-MM-DDTHH:MM
        #[arg(long)]
        end: String,
        /// productive (p, +), unproductive (u, -), neutral (n, 0) or cancel (c)
        #[arg(long, allow_hyphen_values = true)]
        eval: Evaluation,
        /// What happened
        #[arg(long)]
        story: Option<String>,
    },
    /// List the entries of the selected date as JSON
    List,
}

pub fn run(action: EntryAction) -> CliResult {
    let mut session = open_session()?;

    match action {
        EntryAction::Add { end, eval, story } => {
            let end = parse_end(&end, session.state().selected_date())?;
            session.begin_entry(end, now())?;
            let event = session.confirm_entry(story, eval)?;
            park_session(&session)?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        EntryAction::List => {
            let json = serde_json::to_string_pretty(session.state().entries())?;
            println!("{json}");
        }
    }
    Ok(())
}

/// Resolve an `--end` argument against the selected date.
fn parse_end(raw: &str, date: NaiveDate) -> CliResult<NaiveDateTime> {
    let raw = raw.trim();
    if raw == "24:00" {
        return Ok(end_of_day(date));
    }
    if let Ok(time) = NaiveTime::parse_from_str(raw, "%H:%M") {
        return Ok(date.and_time(time));
    }
    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(at) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(at);
        }
    }
    Err(format!("invalid end time '{raw}', expected HH:MM, 24:00 or YYYY-MM-DDTHH:MM").into())
}
