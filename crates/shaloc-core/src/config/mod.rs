//! Configuration management for shaloc.
//!
//! This module handles loading, saving, and managing the defaults used by the
//! `share` and `serve` commands. Command-line flags always win over the file.
//!
//! ## Configuration File Locations
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.config/shaloc/config.toml` |
//! | macOS | `~/Library/Application Support/com.shaloc.Shaloc/config.toml` |
//! | Windows | `%APPDATA%\shaloc\Shaloc\config\config.toml` |
//!
//! ## Example
//!
//! ```toml
//! [share]
//! ip = "0.0.0.0"
//! port = "1337"
//! max_downloads = 1
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main configuration struct for shaloc.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Defaults for sharing
    pub share: ShareConfig,
}

/// Share configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    /// IP address to bind to
    pub ip: String,
    /// Port to bind to
    pub port: String,
    /// Length of a random route; 0 derives the route from the file name
    pub random_length: usize,
    /// Maximum number of downloads; negative means unbounded
    pub max_downloads: i64,
    /// How long in-flight downloads may take to finish once the server stops
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            ip: crate::DEFAULT_IP.to_string(),
            port: crate::DEFAULT_PORT.to_string(),
            random_length: 0,
            max_downloads: -1,
            shutdown_timeout: Duration::from_secs(crate::DEFAULT_SHUTDOWN_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// If the configuration file doesn't exist, returns the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("Failed to read config: {e}")))?;

        toml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to the default location.
    ///
    /// Creates the configuration directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be written.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be written.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::ConfigError(format!("Failed to create config directory: {e}"))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| Error::ConfigError(format!("Failed to write config: {e}")))
    }

    /// Get the default configuration directory path.
    #[must_use]
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "shaloc", "Shaloc")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the full path to the configuration file.
    #[must_use]
    pub fn config_path() -> PathBuf {
        Self::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("config.toml")
    }
}

mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{}s", duration.as_secs()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.strip_suffix('s')
            .map(|secs| {
                secs.parse()
                    .map(Duration::from_secs)
                    .map_err(serde::de::Error::custom)
            })
            .or_else(|| {
                s.strip_suffix('m').map(|mins| {
                    mins.parse::<u64>()
                        .map(|m| Duration::from_secs(m * 60))
                        .map_err(serde::de::Error::custom)
                })
            })
            .unwrap_or_else(|| Err(serde::de::Error::custom("invalid duration format")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.share.ip, "127.0.0.1");
        assert_eq!(config.share.port, "8080");
        assert_eq!(config.share.random_length, 0);
        assert_eq!(config.share.max_downloads, -1);
        assert_eq!(config.share.shutdown_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config").join("config.toml");

        let mut original = Config::default();
        original.share.port = "1337".into();
        original.share.max_downloads = 3;
        original.share.shutdown_timeout = Duration::from_secs(120);
        original.save_to(&path).expect("save");

        let loaded = Config::load_from(&path).expect("load");
        assert_eq!(loaded.share.port, "1337");
        assert_eq!(loaded.share.max_downloads, 3);
        assert_eq!(loaded.share.shutdown_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_config_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.share.ip, crate::DEFAULT_IP);
    }

    #[test]
    fn test_config_deserialization_partial() {
        let partial_toml = r#"
[share]
ip = "0.0.0.0"
shutdown_timeout = "2m"
"#;
        let config: Config = toml::from_str(partial_toml).expect("parse partial config");
        assert_eq!(config.share.ip, "0.0.0.0");
        assert_eq!(config.share.port, "8080");
        assert_eq!(config.share.shutdown_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_config_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[share]\nport = [").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn test_invalid_duration_rejected() {
        let result: std::result::Result<Config, _> =
            toml::from_str("[share]\nshutdown_timeout = \"soon\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_path() {
        let path = Config::config_path();
        assert!(path.ends_with("config.toml"));
    }
}
