//! Tracing subscriber setup.

use crate::config::Config;
use crate::error::Result;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the configured log filter.
pub const LOG_ENV: &str = "PURR_LOG";

fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install the global subscriber.
///
/// The TUI owns the terminal, so it logs only to the configured file (or not
/// at all). CLI mode logs to stderr when no file is configured.
pub fn init(config: &Config, interactive_tui: bool) -> Result<()> {
    let level = |default: &str| config.log_level.clone().unwrap_or_else(|| default.to_string());

    match (&config.log_file, interactive_tui) {
        (Some(path), _) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter(&level("info")))
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .ok();
        }
        (None, false) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter(&level("warn")))
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init()
                .ok();
        }
        (None, true) => {}
    }
    Ok(())
}
