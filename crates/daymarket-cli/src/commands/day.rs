use clap::Subcommand;
use serde_json::json;

use super::{now, open_session, park_session, parse_date, CliResult, Session};

const TITLE_FORMAT: &str = "%Y.%m.%d.%a";

#[derive(Subcommand)]
pub enum DayAction {
    /// Print the selected day, its entries and prices as JSON
    Status,
    /// Select another date, discarding unsaved entries
    Select {
        /// Date (YYYY-MM-DD)
        date: String,
    },
    /// Print the selectable date range as JSON
    Bounds,
    /// Discard unsaved entries of the selected date
    Discard,
    /// Commit the selected date to history
    Submit {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

pub fn run(action: DayAction) -> CliResult {
    let mut session = open_session()?;
    let now = now();

    match action {
        DayAction::Status => {
            println!("{}", serde_json::to_string_pretty(&status(&session))?);
        }
        DayAction::Select { date } => {
            let date = parse_date(&date)?;
            let event = session.select_date(date, now)?;
            park_session(&session)?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        DayAction::Bounds => {
            let bounds = session.date_bounds(now)?;
            println!("{}", serde_json::to_string_pretty(&bounds)?);
        }
        DayAction::Discard => {
            let event = session.discard_session()?;
            park_session(&session)?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        DayAction::Submit { yes } => {
            let submission = session.prepare_submission()?;
            let candle = submission.candle();
            eprintln!(
                "{}: {} entries, open {:.2} high {:.2} low {:.2} close {:.2}",
                submission.date().format(TITLE_FORMAT),
                submission.entries().len(),
                candle.open,
                candle.high,
                candle.low,
                candle.close,
            );

            if !yes {
                let confirmed = inquire::Confirm::new("Commit this day? It cannot be edited afterwards.")
                    .with_default(false)
                    .prompt()?;
                if !confirmed {
                    eprintln!("submission cancelled");
                    return Ok(());
                }
            }

            let event = session.submit(submission)?;
            park_session(&session)?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
    }
    Ok(())
}

fn status(session: &Session) -> serde_json::Value {
    let now = now();
    let state = session.state();
    let placeholder = session.settings().placeholder_story.as_str();

    let entries: Vec<serde_json::Value> = state
        .entries()
        .iter()
        .zip(state.prices())
        .map(|(entry, price)| {
            json!({
                "story": entry.display_story(placeholder),
                "start": entry.start_time(),
                "end": entry.end_time(),
                "eval": entry.eval(),
                "minutes": entry.elapsed_minutes(),
                "price": price,
            })
        })
        .collect();

    json!({
        "title": state.selected_date().format(TITLE_FORMAT).to_string(),
        "date": state.selected_date(),
        "window_start": state.window_start(),
        "window_limit": session.window_limit(now),
        "previous_close": state.previous_close(),
        "current_price": state.current_price(),
        "entries": entries,
        "caught_up": session.is_caught_up(now),
    })
}
