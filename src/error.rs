use thiserror::Error;

/// Errors surfaced to the user, either in the result pane or on stderr.
#[derive(Error, Debug)]
pub enum PurrError {
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("{0}")]
    Command(String),

    #[error("table generator: {0}")]
    Schema(String),

    #[error("no database is open; use \\o <file> to open one")]
    NoDatabase,

    #[error("no open database matches '{0}'")]
    UnknownDatabase(String),
}

pub type Result<T> = std::result::Result<T, PurrError>;
