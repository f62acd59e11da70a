//! Structured logging with tracing, written to stderr.

use daymarket_core::Config;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter precedence: DAYMARKET_LOG, RUST_LOG, then `logging.level` from config.
pub fn init() {
    let fallback = Config::load()
        .map(|cfg| cfg.logging.level)
        .unwrap_or_else(|_| "warn".to_string());

    let filter = EnvFilter::try_from_env("DAYMARKET_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(fallback));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
