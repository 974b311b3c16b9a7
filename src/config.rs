//! Application configuration.
//!
//! Settings live in `<config_dir>/ambience/config.json`. Every field has a
//! default, so a missing file or a file naming only some fields is fine.
//! Command-line flags override what the file says.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::storage::{StorageError, PREFERENCE_TTL_DAYS};
use crate::types::{clamp_volume, DEFAULT_MASTER_VOLUME};

/// Directory name used under the platform config and data directories.
pub const APP_DIR: &str = "ambience";

/// File name of the configuration file.
pub const CONFIG_FILE: &str = "config.json";

/// Default base for share links.
fn default_share_base_url() -> String {
    "https://ambience.app/".to_string()
}

/// Default delay before a shared mix starts playing, in milliseconds.
fn default_autoplay_delay_ms() -> u64 {
    500
}

fn default_preference_ttl_days() -> u32 {
    PREFERENCE_TTL_DAYS
}

fn default_volume() -> f32 {
    DEFAULT_MASTER_VOLUME
}

/// Errors raised while reading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Application configuration.
///
/// # Example
///
/// ```
/// use ambience::config::AppConfig;
///
/// let config = AppConfig::default();
/// assert_eq!(config.autoplay_delay_ms, 500);
/// assert_eq!(config.preference_ttl_days, 30);
/// assert!(config.catalog_path.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Where preferences and saved mixes are stored.
    /// Defaults to `<data_dir>/ambience`.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Directory track sources are resolved against.
    /// Defaults to `sounds` inside the data directory.
    #[serde(default)]
    pub sounds_dir: Option<PathBuf>,

    /// JSON catalog replacing the built-in track list.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,

    /// Base URL share links are built on.
    #[serde(default = "default_share_base_url")]
    pub share_base_url: String,

    /// Grace delay before a shared mix autoplays, in milliseconds.
    #[serde(default = "default_autoplay_delay_ms")]
    pub autoplay_delay_ms: u64,

    /// Lifetime of the remembered playback preferences.
    #[serde(default = "default_preference_ttl_days")]
    pub preference_ttl_days: u32,

    /// Master volume used until the user picks one.
    #[serde(default = "default_volume")]
    pub default_volume: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            sounds_dir: None,
            catalog_path: None,
            share_base_url: default_share_base_url(),
            autoplay_delay_ms: default_autoplay_delay_ms(),
            preference_ttl_days: default_preference_ttl_days(),
            default_volume: default_volume(),
        }
    }
}

impl AppConfig {
    /// Platform location of the configuration file.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Loads the configuration from `path`. A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {:?}, using defaults", path);
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Resolved data directory.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NoDataDir` if none is configured and the
    /// platform has no data directory.
    pub fn data_dir(&self) -> Result<PathBuf, StorageError> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(StorageError::NoDataDir),
        }
    }

    /// Resolved sounds directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be resolved.
    pub fn sounds_dir(&self) -> Result<PathBuf, StorageError> {
        match &self.sounds_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(self.data_dir()?.join("sounds")),
        }
    }

    #[must_use]
    pub fn autoplay_delay(&self) -> Duration {
        Duration::from_millis(self.autoplay_delay_ms)
    }

    /// Initial master volume, clamped.
    #[must_use]
    pub fn initial_volume(&self) -> f32 {
        clamp_volume(self.default_volume)
    }
}
