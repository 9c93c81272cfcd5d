use anyhow::{Context, Result, anyhow, ensure};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{feed::ilmateenistus::DEFAULT_FEED_URL, schedule::ImportSchedule};

/// Settings of the periodic weather import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Seconds between two import cycles.
    pub interval_secs: u64,
    /// Import once right away instead of waiting a full interval.
    pub run_on_start: bool,
    pub http_timeout_secs: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self { interval_secs: 3600, run_on_start: true, http_timeout_secs: 30 }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// feed_url = "https://www.ilmateenistus.ee/ilma_andmed/xml/observations.php"
/// log_level = "info"
///
/// [import]
/// interval_secs = 3600
/// run_on_start = true
/// http_timeout_secs = 30
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub feed_url: String,
    /// Default log filter, overridden by `RUST_LOG`.
    pub log_level: String,
    pub import: ImportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            log_level: "info".to_string(),
            import: ImportConfig::default(),
        }
    }
}

impl Config {
    /// Load config from the platform config directory, or return defaults if
    /// it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Load config from an explicit path, falling back to defaults when the
    /// file is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        cfg.validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, self.to_toml()?)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("ee", "delivery-fee", "delivery-fee")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.feed_url.trim().is_empty(), "feed_url must not be empty");
        ensure!(self.import.interval_secs > 0, "import.interval_secs must be greater than zero");
        ensure!(
            self.import.http_timeout_secs > 0,
            "import.http_timeout_secs must be greater than zero"
        );
        Ok(())
    }

    pub fn schedule(&self) -> ImportSchedule {
        ImportSchedule {
            interval: Duration::from_secs(self.import.interval_secs),
            run_on_start: self.import.run_on_start,
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.import.http_timeout_secs)
    }
}
