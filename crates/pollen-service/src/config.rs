//! Service configuration.
//!
//! Settings come from a TOML file, then environment variables, then
//! command line flags, each layer overriding the previous one.

use std::path::{Path, PathBuf};
use std::time::Duration;

use redis::{ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use serde::{Deserialize, Serialize};

/// Upstream pollen forecast published by the DWD.
pub const DEFAULT_FEED_URL: &str =
    "https://opendata.dwd.de/climate_environment/health/alerts/s31fg.json";

/// Port used when `storage.host` names no port.
pub const DEFAULT_REDIS_PORT: u16 = 6379;

/// Minimum sync interval in seconds (1 minute).
pub const MIN_SYNC_INTERVAL: u64 = 60;

/// Service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server settings.
    pub server: ServerConfig,
    /// Storage settings.
    pub storage: StorageConfig,
    /// Feed sync settings.
    pub sync: SyncConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Apply `REDIS_HOST`, `REDIS_PASSWORD` and `REDIS_KEY_PREFIX` from the
    /// process environment.
    pub fn apply_env(&mut self) {
        self.apply_vars(|name| std::env::var(name).ok());
    }

    fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("REDIS_HOST") {
            self.storage.host = host;
        }
        if let Some(password) = lookup("REDIS_PASSWORD") {
            self.storage.password = (!password.is_empty()).then_some(password);
        }
        if let Some(prefix) = lookup("REDIS_KEY_PREFIX") {
            self.storage.key_prefix = prefix;
        }
    }

    /// Validate the configuration and return any errors.
    ///
    /// This checks:
    /// - Server bind address is valid (host:port format)
    /// - Storage host is not empty and timeouts are non-zero
    /// - Feed URL is an http(s) URL
    /// - Sync interval is at least one minute
    ///
    /// # Example
    ///
    /// ```
    /// use pollen_service::Config;
    ///
    /// let config = Config::default();
    /// config.validate().expect("Default config should be valid");
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        errors.extend(self.server.validate());
        errors.extend(self.storage.validate());
        errors.extend(self.sync.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
        }
    }
}

impl ServerConfig {
    /// Validate server configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.bind.is_empty() {
            errors.push(ValidationError::new(
                "server.bind",
                "bind address cannot be empty",
            ));
            return errors;
        }

        match self.bind.rsplit_once(':') {
            None => errors.push(ValidationError::new(
                "server.bind",
                format!(
                    "invalid bind address '{}': expected format 'host:port'",
                    self.bind
                ),
            )),
            Some((_, port)) => match port.parse::<u16>() {
                Ok(0) => errors.push(ValidationError::new("server.bind", "port cannot be 0")),
                Err(_) => errors.push(ValidationError::new(
                    "server.bind",
                    format!("invalid port '{}': must be a number 1-65535", port),
                )),
                Ok(_) => {}
            },
        }

        errors
    }
}

/// Redis storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Redis `host:port`.
    pub host: String,
    /// Redis password, if the server requires one.
    pub password: Option<String>,
    /// Namespace prepended to every key. Empty means no prefix.
    pub key_prefix: String,
    /// How long to wait for the initial connection, in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            host: "localhost:6379".to_string(),
            password: None,
            key_prefix: String::new(),
            connect_timeout_secs: 5,
        }
    }
}

impl StorageConfig {
    /// Connection parameters for the configured server, database 0.
    ///
    /// The password is handed to the client as is. It is never embedded in
    /// a URL, so it needs no escaping.
    ///
    /// ```
    /// use pollen_service::StorageConfig;
    ///
    /// let storage = StorageConfig {
    ///     host: "cache:6380".to_string(),
    ///     password: Some("hunter2".to_string()),
    ///     ..Default::default()
    /// };
    /// let info = storage.connection_info().unwrap();
    /// assert_eq!(info.addr.to_string(), "cache:6380");
    /// assert_eq!(info.redis.password.as_deref(), Some("hunter2"));
    /// ```
    pub fn connection_info(&self) -> Result<ConnectionInfo, ConfigError> {
        let (host, port) = self.address().ok_or_else(|| {
            ConfigError::Validation(vec![self.invalid_host()])
        })?;

        Ok(ConnectionInfo {
            addr: ConnectionAddr::Tcp(host.to_string(), port),
            redis: RedisConnectionInfo {
                db: 0,
                password: self.password.clone(),
                ..Default::default()
            },
        })
    }

    /// Host and port of `host`. The port defaults to 6379.
    fn address(&self) -> Option<(&str, u16)> {
        let (host, port) = match self.host.rsplit_once(':') {
            // bare IPv6 address without brackets
            Some((host, _)) if host.contains(':') && !host.starts_with('[') => {
                (self.host.as_str(), DEFAULT_REDIS_PORT)
            }
            Some((host, port)) => (host, port.parse::<u16>().ok()?),
            None => (self.host.as_str(), DEFAULT_REDIS_PORT),
        };
        let host = host.trim_start_matches('[').trim_end_matches(']');
        (!host.is_empty() && port != 0).then_some((host, port))
    }

    fn invalid_host(&self) -> ValidationError {
        ValidationError::new(
            "storage.host",
            format!("invalid redis host '{}': expected 'host' or 'host:port'", self.host),
        )
    }

    /// Initial connection timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Validate storage configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.host.is_empty() {
            errors.push(ValidationError::new(
                "storage.host",
                "redis host cannot be empty",
            ));
        } else if self.address().is_none() {
            errors.push(self.invalid_host());
        }
        if self.connect_timeout_secs == 0 {
            errors.push(ValidationError::new(
                "storage.connect_timeout_secs",
                "connect timeout must be at least 1 second",
            ));
        }

        errors
    }
}

/// Feed sync configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// URL of the upstream feed.
    pub url: String,
    /// Pause between the end of one sync run and the start of the next, in seconds.
    pub interval_secs: u64,
    /// Timeout for the feed request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_FEED_URL.to_string(),
            interval_secs: 3600,
            request_timeout_secs: 30,
        }
    }
}

impl SyncConfig {
    /// Pause between sync runs.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Feed request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate sync configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            errors.push(ValidationError::new(
                "sync.url",
                format!("invalid feed url '{}': must start with http:// or https://", self.url),
            ));
        }
        if self.interval_secs < MIN_SYNC_INTERVAL {
            errors.push(ValidationError::new(
                "sync.interval_secs",
                format!(
                    "sync interval {} is too short (minimum {} seconds)",
                    self.interval_secs, MIN_SYNC_INTERVAL
                ),
            ));
        }
        if self.request_timeout_secs == 0 {
            errors.push(ValidationError::new(
                "sync.request_timeout_secs",
                "request timeout must be at least 1 second",
            ));
        }

        errors
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field path (e.g., `server.bind` or `sync.interval_secs`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pollen")
        .join("server.toml")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn validation_fields(config: &Config) -> Vec<String> {
        match config.validate() {
            Err(ConfigError::Validation(errors)) => errors.into_iter().map(|e| e.field).collect(),
            Err(e) => panic!("unexpected error: {e}"),
            Ok(()) => Vec::new(),
        }
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server.bind, "0.0.0.0:8000");
        assert_eq!(config.storage.host, "localhost:6379");
        assert_eq!(config.storage.key_prefix, "");
        assert_eq!(config.sync.url, DEFAULT_FEED_URL);
        assert_eq!(config.sync.interval(), Duration::from_secs(3600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml = r#"
            [storage]
            key_prefix = "pollen"

            [sync]
            interval_secs = 900
        "#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.storage.key_prefix, "pollen");
        assert_eq!(config.storage.host, "localhost:6379");
        assert_eq!(config.sync.interval_secs, 900);
        assert_eq!(config.sync.request_timeout_secs, 30);
        assert_eq!(config.server.bind, "0.0.0.0:8000");
    }

    #[test]
    fn test_config_written_as_toml_loads_back() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("server.toml");

        let config = Config {
            server: ServerConfig {
                bind: "127.0.0.1:9090".to_string(),
            },
            storage: StorageConfig {
                host: "redis:6379".to_string(),
                password: Some("secret".to_string()),
                key_prefix: "pollen".to_string(),
                connect_timeout_secs: 2,
            },
            sync: SyncConfig {
                url: "http://localhost:1234/feed.json".to_string(),
                interval_secs: 600,
                request_timeout_secs: 10,
            },
        };

        std::fs::write(&config_path, toml::to_string_pretty(&config).unwrap()).unwrap();
        let loaded = Config::load(&config_path).unwrap();

        assert_eq!(loaded.server.bind, "127.0.0.1:9090");
        assert_eq!(loaded.storage.host, "redis:6379");
        assert_eq!(loaded.storage.password.as_deref(), Some("secret"));
        assert_eq!(loaded.storage.key_prefix, "pollen");
        assert_eq!(loaded.sync.url, "http://localhost:1234/feed.json");
        assert_eq!(loaded.sync.interval_secs, 600);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/nonexistent/pollen/server.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_invalid_toml() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("bad.toml");
        std::fs::write(&path, "[server\nbind = ").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("REDIS_HOST", "cache:6380"),
            ("REDIS_PASSWORD", "pw"),
            ("REDIS_KEY_PREFIX", "staging"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_vars(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.storage.host, "cache:6380");
        assert_eq!(config.storage.password.as_deref(), Some("pw"));
        assert_eq!(config.storage.key_prefix, "staging");

        let info = config.storage.connection_info().unwrap();
        assert_eq!(info.addr, ConnectionAddr::Tcp("cache".to_string(), 6380));
        assert_eq!(info.redis.password.as_deref(), Some("pw"));
        assert_eq!(info.redis.db, 0);
    }

    #[test]
    fn test_password_with_url_special_characters() {
        for password in ["a/b#c%", "p#ss", "x?y", "100%25", "user:pw@host"] {
            let storage = StorageConfig {
                password: Some(password.to_string()),
                ..Default::default()
            };

            let info = storage.connection_info().unwrap();
            assert_eq!(info.redis.password.as_deref(), Some(password));

            // opening a client only checks the parameters, it does not connect
            let client = redis::Client::open(info).unwrap();
            assert_eq!(
                client.get_connection_info().redis.password.as_deref(),
                Some(password)
            );
        }
    }

    #[test]
    fn test_redis_host_forms() {
        let address = |host: &str| {
            let storage = StorageConfig {
                host: host.to_string(),
                ..Default::default()
            };
            storage.connection_info().ok().map(|info| info.addr)
        };

        assert_eq!(
            address("localhost"),
            Some(ConnectionAddr::Tcp("localhost".to_string(), 6379))
        );
        assert_eq!(
            address("10.0.0.5:6380"),
            Some(ConnectionAddr::Tcp("10.0.0.5".to_string(), 6380))
        );
        assert_eq!(
            address("[::1]:6381"),
            Some(ConnectionAddr::Tcp("::1".to_string(), 6381))
        );
        assert_eq!(address("cache:redis"), None);
        assert_eq!(address("cache:0"), None);
    }

    #[test]
    fn test_validate_redis_host() {
        let mut config = Config::default();
        config.storage.host = "cache:port".to_string();
        assert_eq!(validation_fields(&config), vec!["storage.host"]);

        config.storage.host = "cache".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_password_env_means_none() {
        let mut config = Config::default();
        config.storage.password = Some("old".to_string());
        config.apply_vars(|name| (name == "REDIS_PASSWORD").then(String::new));

        assert_eq!(config.storage.password, None);
        assert_eq!(config.storage.host, "localhost:6379");
    }

    #[test]
    fn test_validate_bind_address() {
        let mut config = Config::default();

        config.server.bind = "localhost".to_string();
        assert_eq!(validation_fields(&config), vec!["server.bind"]);

        config.server.bind = "localhost:0".to_string();
        assert_eq!(validation_fields(&config), vec!["server.bind"]);

        config.server.bind = "localhost:http".to_string();
        assert_eq!(validation_fields(&config), vec!["server.bind"]);

        config.server.bind = "[::1]:8000".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let config = Config {
            server: ServerConfig::default(),
            storage: StorageConfig {
                host: String::new(),
                connect_timeout_secs: 0,
                ..Default::default()
            },
            sync: SyncConfig {
                url: "ftp://example.com/feed".to_string(),
                interval_secs: 5,
                request_timeout_secs: 0,
            },
        };

        let fields = validation_fields(&config);

        assert_eq!(
            fields,
            vec![
                "storage.host",
                "storage.connect_timeout_secs",
                "sync.url",
                "sync.interval_secs",
                "sync.request_timeout_secs",
            ]
        );
        let message = config.validate().unwrap_err().to_string();
        assert!(message.contains("sync.interval_secs: sync interval 5 is too short"));
    }

    #[test]
    fn test_default_config_path() {
        let path = default_config_path();
        assert!(path.ends_with("pollen/server.toml"));
    }
}
