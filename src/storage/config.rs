//! Configuration handling for deconf
//!
//! User configuration lives in `~/.config/deconf/config.toml` next to the
//! daemon registry. Every key is optional.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Flags;

/// Config file name inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

/// Default watch poll interval in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine a config directory for this user")]
    NoConfigDir,

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Global user configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default for `--gitignore`
    pub gitignore: Option<bool>,

    /// Default for `--vscode`
    pub vscode: Option<bool>,

    /// How often the watcher checks for document changes
    pub poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gitignore: None,
            vscode: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl Config {
    /// Returns the per-user config directory
    pub fn default_dir() -> Result<PathBuf> {
        ProjectDirs::from("dev", "deconf", "deconf")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or_else(|| ConfigError::NoConfigDir.into())
    }

    /// Loads configuration from a config directory, falling back to defaults
    pub fn load(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse config")
    }

    /// Flags after applying this config over the built-in defaults
    pub fn flags(&self) -> Flags {
        Flags::default().overlay(self.gitignore, self.vscode)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Everything a pipeline run needs, resolved once at startup
#[derive(Debug, Clone)]
pub struct Settings {
    /// Per-user directory holding the registry, config and daemon log
    pub config_dir: PathBuf,

    /// Flags before document metadata is applied
    pub flags: Flags,

    /// Watch poll interval
    pub poll_interval: Duration,
}

impl Settings {
    /// Resolves settings: config file over defaults, then command-line overrides
    pub fn resolve(
        config_dir: PathBuf,
        gitignore: Option<bool>,
        vscode: Option<bool>,
    ) -> Result<Self> {
        let config = Config::load(&config_dir)?;

        Ok(Self {
            flags: config.flags().overlay(gitignore, vscode),
            poll_interval: config.poll_interval(),
            config_dir,
        })
    }
}
