//! Optional TOML configuration file, merged with command-line flags.

use crate::Args;
use crate::error::{PurrError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Settings read from `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Database files opened at start-up.
    pub databases: Vec<PathBuf>,
    /// Row limit used by the explorer's "select top" action.
    pub row_limit: usize,
    /// Start with expanded (vertical record) display.
    pub expanded: bool,
    /// Start with query timing shown.
    pub timing: bool,
    pub log_file: Option<PathBuf>,
    /// Log filter; defaults to `info` for a log file and `warn` on stderr.
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            databases: Vec::new(),
            row_limit: 200,
            expanded: false,
            timing: false,
            log_file: None,
            log_level: None,
        }
    }
}

impl Config {
    /// Parse a config document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.row_limit == 0 {
            return Err(PurrError::Config("row_limit must be at least 1".to_string()));
        }
        Ok(config)
    }

    /// Apply command-line overrides. Positional databases are opened after configured ones.
    pub fn merge_args(mut self, args: &Args) -> Self {
        for db in &args.databases {
            if !self.databases.contains(db) {
                self.databases.push(db.clone());
            }
        }
        if let Some(ref file) = args.log_file {
            self.log_file = Some(file.clone());
        }
        if let Some(ref level) = args.log_level {
            self.log_level = Some(level.clone());
        }
        self
    }
}

/// Default config location, `<config dir>/purr/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("purr").join("config.toml"))
}

/// Load the configuration. An explicit path must exist; the default one may not.
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let path = match config_path {
        Some(path) => {
            if !path.exists() {
                return Err(PurrError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(Config::default()),
        },
    };

    let content = std::fs::read_to_string(&path)?;
    Config::from_toml(&content)
        .map_err(|e| PurrError::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.row_limit, 200);
        assert_eq!(config.log_level, None);
        assert!(config.databases.is_empty());
    }

    #[test]
    fn test_from_toml() {
        let config = Config::from_toml(
            r#"
            databases = ["a.db", "b.sqlite"]
            row_limit = 50
            timing = true
            "#,
        )
        .unwrap();
        assert_eq!(
            config.databases,
            vec![PathBuf::from("a.db"), PathBuf::from("b.sqlite")]
        );
        assert_eq!(config.row_limit, 50);
        assert!(config.timing);
        assert!(!config.expanded);
    }

    #[test]
    fn test_unknown_key_is_error() {
        assert!(Config::from_toml("colour = \"red\"").is_err());
    }

    #[test]
    fn test_zero_row_limit_rejected() {
        assert!(Config::from_toml("row_limit = 0").is_err());
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = load_config(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "expanded = true\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert!(config.expanded);
    }

    #[test]
    fn test_merge_args() {
        let args = Args::parse_from(["purr", "a.db", "c.db", "--log-level", "debug"]);
        let config = Config {
            databases: vec![PathBuf::from("a.db")],
            ..Config::default()
        }
        .merge_args(&args);
        assert_eq!(
            config.databases,
            vec![PathBuf::from("a.db"), PathBuf::from("c.db")]
        );
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }
}
