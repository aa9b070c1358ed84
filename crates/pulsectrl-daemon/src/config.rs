//! Daemon configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use pulsectrl_pulse::SessionConfig;
use serde::{Deserialize, Serialize};

/// Daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Daemon settings
    #[serde(default)]
    pub daemon: DaemonConfig,
    /// Audio server session settings
    #[serde(default)]
    pub session: SessionSettings,
}

/// Daemon-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self { log_level: default_log_level() }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Audio server session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Application name announced to the server
    #[serde(default = "default_client_name")]
    pub client_name: String,
    /// Server address (optional, uses the library default if not set)
    pub server: Option<String>,
    /// Delay before reconnecting after a failure
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Upper bound on how long the session blocks before checking for commands
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            client_name: default_client_name(),
            server: None,
            reconnect_delay_ms: default_reconnect_delay_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl SessionSettings {
    /// Convert into the runtime's session configuration.
    #[must_use]
    pub fn to_session_config(&self) -> SessionConfig {
        SessionConfig {
            client_name: self.client_name.clone(),
            server: self.server.clone(),
            reconnect_delay: Duration::from_millis(self.reconnect_delay_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }
}

fn default_client_name() -> String {
    "pulsectrl".to_string()
}

fn default_reconnect_delay_ms() -> u64 {
    2000
}

fn default_poll_interval_ms() -> u64 {
    50
}

/// Load configuration from `path`, or defaults if it does not exist.
pub fn load_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {path:?}"))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {path:?}"))?;
    Ok(config)
}

/// Get the configuration file path.
pub fn config_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("org", "pulsectrl", "pulsectrl")
        .context("Could not determine config directory")?;
    Ok(dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_from(&dir.path().join("config.toml")).unwrap();

        assert_eq!(config.daemon.log_level, "info");
        assert_eq!(config.session.client_name, "pulsectrl");
        assert_eq!(config.session.server, None);
        assert_eq!(config.session.reconnect_delay_ms, 2000);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[session]\nreconnect_delay_ms = 500\nserver = \"unix:/tmp/pulse.sock\"").unwrap();

        let config = load_from(file.path()).unwrap();

        assert_eq!(config.daemon.log_level, "info");
        assert_eq!(config.session.reconnect_delay_ms, 500);
        assert_eq!(config.session.server.as_deref(), Some("unix:/tmp/pulse.sock"));
        assert_eq!(config.session.poll_interval_ms, 50);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[session\nclient_name = 1").unwrap();

        assert!(load_from(file.path()).is_err());
    }

    #[test]
    fn test_session_config_conversion() {
        let settings = SessionSettings {
            client_name: "bar".to_string(),
            server: None,
            reconnect_delay_ms: 1500,
            poll_interval_ms: 20,
        };

        let session = settings.to_session_config();

        assert_eq!(session.client_name, "bar");
        assert_eq!(session.reconnect_delay, Duration::from_millis(1500));
        assert_eq!(session.poll_interval, Duration::from_millis(20));
    }
}
