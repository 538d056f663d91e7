//! The persisted configuration document, which also carries the watermark.

use crate::config::Config;
use crate::error::{ConfigError, ConfigResult};
use crate::paths::AppPaths;
use chrono::{DateTime, Utc};
use citations_core::epoch;
use std::path::{Path, PathBuf};
use tracing::info;

/// Reads and writes the configuration document at a fixed location.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the platform default location.
    pub fn default_location() -> ConfigResult<Self> {
        let paths = AppPaths::new().ok_or(ConfigError::NoConfigDir)?;
        Ok(Self::new(paths.config_file))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> ConfigResult<Config> {
        Config::load_from(&self.path)
    }

    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        config.save_to(&self.path)
    }

    /// Advance the persisted watermark to `to`, keeping everything else as stored.
    pub fn commit_watermark(&self, to: DateTime<Utc>) -> ConfigResult<Config> {
        let mut config = self.load()?;
        if config.advance_watermark(to) {
            self.save(&config)?;
            info!("Watermark advanced to {}", to.to_rfc3339());
        }
        Ok(config)
    }

    /// Move the persisted watermark back to the epoch so the next scan
    /// revisits every file.
    pub fn reset_watermark(&self) -> ConfigResult<Config> {
        let mut config = self.load()?;
        config.last_scan_time = epoch();
        self.save(&config)?;
        info!("Watermark reset");
        Ok(config)
    }
}
