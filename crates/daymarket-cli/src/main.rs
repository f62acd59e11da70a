use clap::{Parser, Subcommand};

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "daymarket", version, about = "Daymarket CLI: rate your day, watch your price")]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Selected day: status, date selection, discard, submit
    Day {
        #[command(subcommand)]
        action: commands::day::DayAction,
    },
    /// Diary entries of the selected day
    Entry {
        #[command(subcommand)]
        action: commands::entry::EntryAction,
    },
    /// Committed days
    History {
        #[command(subcommand)]
        action: commands::history::HistoryAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print shell completions
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init();

    let result = match cli.command {
        Commands::Day { action } => commands::day::run(action),
        Commands::Entry { action } => commands::entry::run(action),
        Commands::History { action } => commands::history::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => commands::completions::run(shell),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
