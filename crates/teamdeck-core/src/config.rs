//! Configuration management for TeamDeck
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `TEAMDECK__SECTION__KEY` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Prefix for environment overrides (`TEAMDECK__SERVER__URL=...`)
pub const ENV_PREFIX: &str = "TEAMDECK";

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend connection
    pub server: ServerConfig,

    /// Reconnect backoff
    pub reconnect: ReconnectConfig,

    /// TUI configuration
    pub tui: TuiConfig,

    /// Notification configuration
    pub notifications: NotificationConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from defaults, the config file, and the environment.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        // A missing .env is the normal case.
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder();
        match path {
            Some(path) => {
                debug!(path = %path.display(), "Loading configuration file");
                builder = builder.add_source(config::File::from(path).required(true));
            }
            None => {
                if let Some(default) = default_config_path() {
                    debug!(path = %default.display(), "Checking default configuration file");
                    builder = builder.add_source(config::File::from(default).required(false));
                }
            }
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "teamdeck", "teamdeck")
}

/// `<config_dir>/teamdeck/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Directory for logs and the notification store
pub fn data_dir() -> PathBuf {
    project_dirs().map_or_else(
        || PathBuf::from(".teamdeck"),
        |dirs| dirs.data_local_dir().to_path_buf(),
    )
}

/// Backend connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// WebSocket URL of the dashboard backend
    pub url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:3001".to_string(),
        }
    }
}

/// Reconnect backoff configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// Delay before the first reconnect attempt
    #[serde(with = "humantime_serde")]
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
        }
    }
}

/// TUI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TuiConfig {
    /// Refresh rate in milliseconds
    pub refresh_rate_ms: u64,
    /// Messages kept in a team feed
    pub max_feed_items: usize,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            refresh_rate_ms: 250,
            max_feed_items: 50,
        }
    }
}

/// Notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Show native desktop notifications for new inbox messages
    pub desktop: bool,
    /// Maximum notifications kept in the store
    pub max_stored: usize,
    /// Store location (defaults to the data directory)
    pub store_path: Option<PathBuf>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            desktop: false,
            max_stored: 100,
            store_path: None,
        }
    }
}

impl NotificationConfig {
    /// Resolved store path
    pub fn store_path(&self) -> PathBuf {
        self.store_path
            .clone()
            .unwrap_or_else(|| data_dir().join("notifications.json"))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (json or pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_backoff_contract() {
        let config = Config::default();
        assert_eq!(config.reconnect.initial_delay, Duration::from_secs(1));
        assert_eq!(config.reconnect.max_delay, Duration::from_secs(30));
        assert_eq!(config.server.url, "ws://localhost:3001");
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nurl = \"ws://example.test:9000\"\n\n[reconnect]\nmax_delay = \"10s\""
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.server.url, "ws://example.test:9000");
        assert_eq!(config.reconnect.max_delay, Duration::from_secs(10));
        assert_eq!(config.reconnect.initial_delay, Duration::from_secs(1));
        assert_eq!(config.tui.max_feed_items, 50);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = Config::load(Some(Path::new("/definitely/not/here/teamdeck.toml")));
        assert!(result.is_err());
    }
}
