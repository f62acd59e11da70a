use clap::Subcommand;
use daymarket_core::{Database, HistoryStore};

use super::{parse_date, CliResult};

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List committed days, newest first
    List {
        /// Maximum number of days
        #[arg(long, default_value = "30")]
        limit: usize,
    },
    /// Show one committed day with its entries
    Show {
        /// Date (YYYY-MM-DD)
        date: String,
    },
}

pub fn run(action: HistoryAction) -> CliResult {
    let db = Database::open()?;

    match action {
        HistoryAction::List { limit } => {
            let days = db.list_days(limit)?;
            println!("{}", serde_json::to_string_pretty(&days)?);
        }
        HistoryAction::Show { date } => {
            let date = parse_date(&date)?;
            match db.load_day(date)? {
                Some(day) => println!("{}", serde_json::to_string_pretty(&day)?),
                None => return Err(format!("no committed day on {date}").into()),
            }
        }
    }
    Ok(())
}
