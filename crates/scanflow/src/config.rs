//! Settings persistence for scanflow.
//!
//! A small TOML record of the last-used scanner and save folder, stored at
//! `<config_dir>/scanflow/config.toml`. The store is handed to the workflow
//! as a trait object so tests can substitute an in-memory or tempdir-backed
//! implementation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Last-used scanner and destination folder. Empty strings when unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub device: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub folder: String,
}

impl Settings {
    /// A saved configuration is usable only when every field is set and the
    /// save folder still exists on disk.
    pub fn is_valid(&self) -> bool {
        !self.device.is_empty()
            && !self.title.is_empty()
            && !self.folder.is_empty()
            && Path::new(&self.folder).exists()
    }
}

/// Two-method persistence contract for settings.
pub trait SettingsStore {
    fn load(&self) -> Result<Settings>;
    fn save(&self, settings: &Settings) -> Result<()>;
}

/// TOML file-backed settings store.
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at the default location under the user config directory.
    pub fn default_location() -> Self {
        Self::new(config_dir().join("config.toml"))
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no settings file, using defaults");
            return Ok(Settings::default());
        }
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("reading settings from {}", self.path.display()))?;
        let settings = toml::from_str(&text)
            .with_context(|| format!("parsing settings file {}", self.path.display()))?;
        Ok(settings)
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating settings directory {}", parent.display()))?;
        }
        let text = toml::to_string_pretty(settings).context("serializing settings")?;
        fs::write(&self.path, text)
            .with_context(|| format!("writing settings to {}", self.path.display()))?;
        Ok(())
    }
}

/// Application config directory: `<config_dir>/scanflow`
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("scanflow")
}

/// Ensure the config directory exists
pub fn ensure_config_dir() -> std::io::Result<PathBuf> {
    let dir = config_dir();
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Logs directory: `<config_dir>/scanflow/logs`
pub fn logs_dir() -> PathBuf {
    config_dir().join("logs")
}

/// Ensure the logs directory exists
pub fn ensure_logs_dir() -> std::io::Result<PathBuf> {
    let dir = logs_dir();
    fs::create_dir_all(&dir)?;
    Ok(dir)
}
