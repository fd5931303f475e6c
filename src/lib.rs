//! # purr
//!
//! A terminal UI (TUI) manager for SQLite databases: SQL editor with syntax
//! highlighting, result grid, activity log and a database/table explorer.
//! Part of the CopyCat ecosystem.

pub mod app;
pub mod classify;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod highlight;
pub mod logging;
pub mod schema;
pub mod script;
pub mod tui;

use clap::Parser;
use std::path::PathBuf;

pub use error::{PurrError, Result};

/// 🐱 purr — TUI SQLite manager
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "purr", version, about = "🐱 purr — TUI SQLite database manager")]
pub struct Args {
    /// Database files to open (created if missing)
    #[arg(value_name = "DATABASES")]
    pub databases: Vec<PathBuf>,

    /// Non-interactive CLI mode
    #[arg(long = "cli")]
    pub cli_mode: bool,

    /// Execute this SQL and exit
    #[arg(short = 'c', long = "command")]
    pub command: Option<String>,

    /// Execute SQL from file
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Write results to file
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format: table, csv, json
    #[arg(long = "format", default_value = "table")]
    pub format: String,

    /// Config file (default: <config dir>/purr/config.toml)
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Append logs to this file
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,

    /// Log filter, e.g. info or purr=debug
    #[arg(long = "log-level")]
    pub log_level: Option<String>,
}

impl Args {
    /// Whether to run without the TUI.
    pub fn wants_cli(&self, stdin_is_piped: bool) -> bool {
        self.cli_mode || stdin_is_piped || self.input.is_some() || self.command.is_some()
    }
}
