mod config;
pub mod database;
pub mod migrations;

pub use config::{Config, LoggingConfig, PriceConfig, SessionConfig};
pub use database::Database;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// `DAYMARKET_DATA_DIR` wins when set. Otherwise `~/.config/daymarket[-dev]/`,
/// where DAYMARKET_ENV=dev selects the development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("DAYMARKET_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("DAYMARKET_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("daymarket-dev")
            } else {
                base_dir.join("daymarket")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
