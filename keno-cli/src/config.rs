//! Runtime configuration.
//!
//! Loaded from an optional TOML file; every field has a default so a partial
//! (or absent) file is valid. Command-line flags are applied on top.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KenoConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// How far back the scoring history reaches.
    pub history_window_hours: u32,
    /// Upper bound on draws fed to the engine.
    pub history_limit: u32,
    pub interval_secs: u64,
    pub error_backoff_secs: u64,
    /// Attempts per cycle before the cycle is given up.
    pub max_retries: u32,
    /// A status report every this many cycles; 0 disables them.
    pub status_every: u32,
    /// Below this many stored draws the scheduler sends estimations.
    pub min_draws_for_prediction: u32,
    pub log_format: LogFormat,
}

impl Default for KenoConfig {
    fn default() -> Self {
        Self {
            db_path: keno_db::db::db_path(),
            history_window_hours: 72,
            history_limit: 100,
            interval_secs: 90,
            error_backoff_secs: 30,
            max_retries: 3,
            status_every: 5,
            min_draws_for_prediction: 10,
            log_format: LogFormat::Compact,
        }
    }
}

impl KenoConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).context("invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config {:?}", path))?;
        Self::from_toml_str(&raw).with_context(|| format!("in {:?}", path))
    }

    /// File config when a path is given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval_secs == 0 {
            bail!("interval_secs must be positive");
        }
        if self.history_limit == 0 {
            bail!("history_limit must be positive");
        }
        if self.max_retries == 0 {
            bail!("max_retries must be at least 1");
        }
        Ok(())
    }

    pub fn history_window(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.history_window_hours))
    }
}
