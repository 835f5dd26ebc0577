//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::ApiConfig;
use crate::websocket::ChannelConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub channels: ChannelsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8090
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Both broadcast channels
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelsConfig {
    #[serde(default)]
    pub tickets: ChannelSettings,

    #[serde(default)]
    pub alerts: ChannelSettings,
}

/// Settings for one broadcast channel
///
/// Fields left out of the file keep the channel's built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelSettings {
    pub path: Option<String>,
    pub greeting: Option<String>,
    pub subscribed_message: Option<String>,
    pub unsubscribed_message: Option<String>,
    pub send_timeout_ms: Option<u64>,
    pub outbound_capacity: Option<usize>,
}

impl ChannelSettings {
    /// Merge these settings over `base`
    pub fn apply(&self, base: ChannelConfig) -> ChannelConfig {
        ChannelConfig {
            name: base.name,
            greeting: self.greeting.clone().unwrap_or(base.greeting),
            subscribed_message: self
                .subscribed_message
                .clone()
                .unwrap_or(base.subscribed_message),
            unsubscribed_message: self
                .unsubscribed_message
                .clone()
                .unwrap_or(base.unsubscribed_message),
            send_timeout: self
                .send_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(base.send_timeout),
            outbound_capacity: self.outbound_capacity.unwrap_or(base.outbound_capacity),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("beacon").join("config.toml")),
            Some(PathBuf::from("/etc/beacon/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Listener and upgrade paths for the API server
    pub fn api_config(&self) -> ApiConfig {
        let defaults = ApiConfig::default();
        ApiConfig {
            host: self.server.host.clone(),
            port: self.server.port,
            tickets_path: self
                .channels
                .tickets
                .path
                .clone()
                .unwrap_or(defaults.tickets_path),
            alerts_path: self
                .channels
                .alerts
                .path
                .clone()
                .unwrap_or(defaults.alerts_path),
        }
    }

    pub fn tickets_channel(&self) -> ChannelConfig {
        self.channels.tickets.apply(ChannelConfig::tickets())
    }

    pub fn alerts_channel(&self) -> ChannelConfig {
        self.channels.alerts.apply(ChannelConfig::alerts())
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("BEACON_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("BEACON_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }

        // Applies to both channels
        if let Ok(timeout) = std::env::var("BEACON_SEND_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse::<u64>() {
                self.channels.tickets.send_timeout_ms = Some(ms);
                self.channels.alerts.send_timeout_ms = Some(ms);
            }
        }

        if let Ok(level) = std::env::var("BEACON_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("BEACON_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Beacon Configuration
#
# Environment variables override these settings:
# - BEACON_HOST
# - BEACON_PORT
# - BEACON_SEND_TIMEOUT_MS (both channels)
# - BEACON_LOG_LEVEL
# - BEACON_LOG_FORMAT

[server]
# Listener host
host = "0.0.0.0"

# Listener port
port = 8090

[channels.tickets]
# WebSocket upgrade path
path = "/ws/tickets"

# Message sent in the welcome envelope
greeting = "Connected to ticket updates"

# Acknowledgement messages for subscribe / unsubscribe
subscribed_message = "Subscribed to ticket updates"
unsubscribed_message = "Unsubscribed from ticket updates"

# Longest a single send may wait on a slow client (ms)
send_timeout_ms = 5000

# Frames buffered per connection
outbound_capacity = 64

[channels.alerts]
path = "/ws/alerts"
greeting = "Connected to system alerts"
subscribed_message = "Subscribed to system alerts"
unsubscribed_message = "Unsubscribed from system alerts"
send_timeout_ms = 5000
outbound_capacity = 64

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_template_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.server.port, 8090);
        assert_eq!(config.api_config().tickets_path, "/ws/tickets");
        assert_eq!(config.api_config().alerts_path, "/ws/alerts");
        assert_eq!(config.tickets_channel().send_timeout, Duration::from_secs(5));
        assert_eq!(config.alerts_channel().greeting, "Connected to system alerts");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nport = 9100\n\n[channels.alerts]\ngreeting = \"Ops console online\"\noutbound_capacity = 8\n"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.logging.format, "pretty");

        let alerts = config.alerts_channel();
        assert_eq!(alerts.name, "alerts");
        assert_eq!(alerts.greeting, "Ops console online");
        assert_eq!(alerts.outbound_capacity, 8);
        assert_eq!(alerts.subscribed_message, "Subscribed to system alerts");

        let tickets = config.tickets_channel();
        assert_eq!(tickets.greeting, "Connected to ticket updates");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = Config::load(Path::new("/nonexistent/beacon.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();

        let result = Config::load(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
