//! Configuration file handling for plate-snap.
//!
//! Loads configuration from `~/.config/plate-snap/config.toml` or a custom path.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::snapshot::DEFAULT_JPEG_QUALITY;
use crate::upload::{DEFAULT_SERVER_URL, SERVER_URL_ENV};

/// Configuration file structure for plate-snap.
/// Loaded from ~/.config/plate-snap/config.toml (or custom path via --config).
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
}

#[derive(Debug, Deserialize, Default)]
pub struct ServerConfig {
    /// Base URL of the recognition server
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CameraConfig {
    /// Camera device index (from list-cameras)
    #[serde(default)]
    pub device: u32,
    /// Seconds to wait for the first frame in one-shot capture
    #[serde(default = "default_warmup_secs")]
    pub warmup_secs: u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: 0,
            warmup_secs: default_warmup_secs(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CaptureConfig {
    /// JPEG quality for uploads (1-100)
    #[serde(default = "default_quality")]
    pub quality: u8,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            quality: default_quality(),
        }
    }
}

fn default_warmup_secs() -> u64 {
    3
}

fn default_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Default config file location.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("plate-snap")
        .join("config.toml")
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;
            let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.clone(),
                source: e,
            })?;
            log::debug!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            log::debug!("No config file at {}, using defaults", path.display());
            Ok(Config::default())
        }
    }

    /// Resolve the server base URL.
    ///
    /// Precedence: `PLATE_SERVER_URL` environment variable, then the
    /// config file, then the built-in default.
    pub fn server_url(&self) -> String {
        if let Ok(url) = std::env::var(SERVER_URL_ENV) {
            if !url.is_empty() {
                return url;
            }
        }
        self.server
            .url
            .clone()
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
    }
}
