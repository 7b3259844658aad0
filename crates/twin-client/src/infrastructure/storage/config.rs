//! TOML-based configuration for the wheel twin.
//!
//! The file is optional.  When it is missing, or when keys are missing from
//! it, every value falls back to the defaults below, so a fresh install runs
//! against the lab controller without any setup.
//!
//! Default location:
//! - Windows:  `%APPDATA%\WheelTwin\config.toml`
//! - Linux:    `~/.config/wheel-twin/config.toml`
//! - macOS:    `~/Library/Application Support/WheelTwin/config.toml`
//!
//! ```toml
//! [link]
//! host = "172.26.109.127"
//! port = 8080
//! reconnect_delay_ms = 3000
//! read_timeout_ms = 500
//! write_timeout_ms = 500
//! framing = "per_read"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Durations are stored as plain millisecond integers so the file stays
//! readable; [`LinkSection::to_link_config`] turns them into the
//! `Duration`-based [`LinkConfig`] the network layer uses.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use twin_core::FramingMode;

use crate::infrastructure::network::config::{LinkConfig, DEFAULT_HOST, DEFAULT_PORT};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value parsed fine but cannot be used.
    #[error("invalid link setting: {0}")]
    InvalidEndpoint(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub link: LinkSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Device endpoint and link timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Pause between failed connection attempts.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Bound on a single read.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Bound on writing one command.
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
    #[serde(default = "default_read_chunk_size")]
    pub read_chunk_size: usize,
    /// `"per_read"` or `"buffered"`.
    #[serde(default)]
    pub framing: FramingMode,
    #[serde(default = "default_dispatch_capacity")]
    pub dispatch_capacity: usize,
    #[serde(default = "default_status_poll_interval_ms")]
    pub status_poll_interval_ms: u64,
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSection {
    /// `tracing` filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_reconnect_delay_ms() -> u64 {
    3000
}
fn default_read_timeout_ms() -> u64 {
    500
}
fn default_write_timeout_ms() -> u64 {
    500
}
fn default_read_chunk_size() -> usize {
    1024
}
fn default_dispatch_capacity() -> usize {
    128
}
fn default_status_poll_interval_ms() -> u64 {
    1000
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LinkSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            read_timeout_ms: default_read_timeout_ms(),
            write_timeout_ms: default_write_timeout_ms(),
            read_chunk_size: default_read_chunk_size(),
            framing: FramingMode::default(),
            dispatch_capacity: default_dispatch_capacity(),
            status_poll_interval_ms: default_status_poll_interval_ms(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LinkSection {
    /// Rejects values the link cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEndpoint`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::InvalidEndpoint("host is empty".to_string()));
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidEndpoint("port must be non-zero".to_string()));
        }
        if self.read_timeout_ms == 0 {
            return Err(ConfigError::InvalidEndpoint(
                "read_timeout_ms must be non-zero".to_string(),
            ));
        }
        if self.write_timeout_ms == 0 {
            return Err(ConfigError::InvalidEndpoint(
                "write_timeout_ms must be non-zero".to_string(),
            ));
        }
        if self.read_chunk_size == 0 {
            return Err(ConfigError::InvalidEndpoint(
                "read_chunk_size must be non-zero".to_string(),
            ));
        }
        if self.dispatch_capacity == 0 {
            return Err(ConfigError::InvalidEndpoint(
                "dispatch_capacity must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_link_config(&self) -> LinkConfig {
        LinkConfig {
            host: self.host.trim().to_string(),
            port: self.port,
            reconnect_delay: Duration::from_millis(self.reconnect_delay_ms),
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            write_timeout: Duration::from_millis(self.write_timeout_ms),
            read_chunk_size: self.read_chunk_size,
            framing: self.framing,
            dispatch_capacity: self.dispatch_capacity,
            status_poll_interval: Duration::from_millis(self.status_poll_interval_ms.max(1)),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// The platform default config file, if the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    platform_config_dir().map(|dir| dir.join("config.toml"))
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("WheelTwin"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("wheel-twin"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("WheelTwin")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_link_section_matches_link_config_defaults() {
        // Arrange / Act
        let from_file = LinkSection::default().to_link_config();

        // Assert
        assert_eq!(from_file, LinkConfig::default());
    }

    #[test]
    fn test_default_log_level_is_info() {
        assert_eq!(AppConfig::default().logging.level, "info");
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        // Arrange
        let text = r#"
            [link]
            host = "10.1.2.3"
            framing = "buffered"
        "#;

        // Act
        let cfg: AppConfig = toml::from_str(text).expect("parse");

        // Assert
        assert_eq!(cfg.link.host, "10.1.2.3");
        assert_eq!(cfg.link.port, 8080);
        assert_eq!(cfg.link.framing, FramingMode::Buffered);
        assert_eq!(cfg.link.reconnect_delay_ms, 3000);
        assert_eq!(cfg.logging, LoggingSection::default());
    }

    #[test]
    fn test_unknown_framing_mode_is_a_parse_error() {
        let result: Result<AppConfig, _> = toml::from_str("[link]\nframing = \"sometimes\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_load_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[link\nhost = ").unwrap();

        assert!(matches!(load_config(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_save_creates_directories_and_load_reads_it_back() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("wheel").join("config.toml");
        let mut cfg = AppConfig::default();
        cfg.link.host = "192.168.4.1".to_string();
        cfg.link.read_timeout_ms = 250;
        cfg.logging.level = "debug".to_string();

        // Act
        save_config(&path, &cfg).unwrap();
        let restored = load_config(&path).unwrap();

        // Assert
        assert_eq!(restored, cfg);
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let mut section = LinkSection::default();
        section.port = 0;
        assert!(matches!(section.validate(), Err(ConfigError::InvalidEndpoint(_))));
    }

    #[test]
    fn test_validate_rejects_zero_write_timeout() {
        let mut section = LinkSection::default();
        section.write_timeout_ms = 0;
        assert!(matches!(section.validate(), Err(ConfigError::InvalidEndpoint(_))));
    }

    #[test]
    fn test_validate_rejects_blank_host() {
        let mut section = LinkSection::default();
        section.host = "  ".to_string();
        assert!(section.validate().is_err());
    }

    #[test]
    fn test_to_link_config_converts_milliseconds() {
        let mut section = LinkSection::default();
        section.reconnect_delay_ms = 10;
        section.read_timeout_ms = 20;
        section.write_timeout_ms = 40;

        let cfg = section.to_link_config();

        assert_eq!(cfg.reconnect_delay, Duration::from_millis(10));
        assert_eq!(cfg.read_timeout, Duration::from_millis(20));
        assert_eq!(cfg.write_timeout, Duration::from_millis(40));
        assert_eq!(cfg.endpoint(), format!("{DEFAULT_HOST}:8080"));
    }
}
