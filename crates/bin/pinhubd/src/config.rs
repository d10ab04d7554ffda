//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `pinhub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Evaluation pipeline settings.
    pub engine: EngineConfig,
    /// Dispatch subsystem settings.
    pub dispatch: DispatchConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Evaluation pipeline configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Devices silent for longer than this are considered dead.
    pub heartbeat_timeout_secs: u64,
}

/// Dispatch subsystem configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Timeout of each network operation against a device.
    pub request_timeout_secs: u64,
    /// Unix datagram socket accepting actions from other processes.
    /// Disabled when unset.
    pub channel_socket: Option<String>,
}

impl Config {
    /// Load configuration from `pinhub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or a
    /// value fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("pinhub.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("PINHUB_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("PINHUB_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("PINHUB_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Ok(val) = std::env::var("PINHUB_DATABASE_URL") {
            self.database.url = val;
        }
        if let Ok(val) = std::env::var("PINHUB_CHANNEL_SOCKET") {
            self.dispatch.channel_socket = Some(val);
        }
        if let Ok(val) = std::env::var("PINHUB_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.engine.heartbeat_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "heartbeat timeout must be non-zero".to_string(),
            ));
        }
        if self.dispatch.request_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "request timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// Devices silent for longer than this are considered dead.
    #[must_use]
    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_secs(self.engine.heartbeat_timeout_secs)
    }

    /// Timeout of each network operation against a device.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch.request_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:pinhub.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "pinhubd=info,pinhub=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            heartbeat_timeout_secs: 60,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            channel_socket: None,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.database.url, "sqlite:pinhub.db?mode=rwc");
        assert_eq!(config.engine.heartbeat_timeout_secs, 60);
        assert_eq!(config.dispatch.request_timeout_secs, 10);
        assert_eq!(config.dispatch.channel_socket, None);
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [server]
            host = '127.0.0.1'
            port = 9090

            [database]
            url = 'sqlite:test.db'

            [logging]
            filter = 'debug'

            [engine]
            heartbeat_timeout_secs = 30

            [dispatch]
            request_timeout_secs = 5
            channel_socket = '/run/pinhub/actions.sock'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.database.url, "sqlite:test.db");
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.heartbeat_timeout(), Duration::from_secs(30));
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(
            config.dispatch.channel_socket.as_deref(),
            Some("/run/pinhub/actions.sock")
        );
    }

    #[test]
    fn should_parse_partial_toml_with_defaults() {
        let toml = "
            [server]
            port = 8080
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.engine.heartbeat_timeout_secs, 60);
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_zero_timeouts() {
        let mut config = Config::default();
        config.engine.heartbeat_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.dispatch.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_format_bind_addr() {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 9090;
        assert_eq!(config.bind_addr(), "127.0.0.1:9090");
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
