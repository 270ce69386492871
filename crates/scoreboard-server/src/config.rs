//! Server configuration parsing.

use std::path::{Path, PathBuf};
use std::time::Duration;

use scoreboard::{BackendConfig, RelationalConfig};
use serde::Deserialize;
use thiserror::Error;

/// Server configuration loaded from a TOML file.
///
/// Only `[server]` is required; every other section has defaults.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Server settings.
    pub server: ServerConfig,
    /// Aggregate store settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// Cross-origin settings.
    #[serde(default)]
    pub cors: CorsConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server bind settings.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1" or "0.0.0.0").
    pub bind: String,
    /// Port to listen on.
    pub port: u16,
    /// Directory of static files served for unmatched paths (the web UI).
    #[serde(default)]
    pub static_path: Option<String>,
}

/// Which aggregate store backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// One JSON document in a fjall keyspace.
    #[default]
    Document,
    /// One SQLite row per contributor.
    Relational,
}

/// Aggregate store settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Directory of the document store.
    pub path: String,
    /// SQLite URL of the relational store.
    pub url: String,
    /// Relational pool size.
    pub max_connections: u32,
    /// Relational connection and lock wait, in seconds.
    pub acquire_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Document,
            path: ".scoreboard".into(),
            url: "sqlite://scoreboard.db".into(),
            max_connections: 5,
            acquire_timeout_secs: 5,
        }
    }
}

impl StoreConfig {
    /// Library-level backend selection for this configuration.
    pub fn backend_config(&self) -> BackendConfig {
        match self.backend {
            StoreBackend::Document => BackendConfig::Document {
                path: PathBuf::from(&self.path),
            },
            StoreBackend::Relational => BackendConfig::Relational(
                RelationalConfig::new(&self.url)
                    .with_max_connections(self.max_connections)
                    .with_acquire_timeout(Duration::from_secs(self.acquire_timeout_secs)),
            ),
        }
    }
}

/// Cross-origin resource sharing settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,
    /// Allowed origins; `"*"` allows any origin.
    pub allow_origins: Vec<String>,
    pub allow_methods: Vec<String>,
    pub allow_headers: Vec<String>,
    /// Ignored when any origin is allowed.
    pub allow_credentials: bool,
    /// Pre-flight cache lifetime in seconds.
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allow_origins: vec!["*".into()],
            allow_methods: ["GET", "POST", "DELETE", "OPTIONS"]
                .map(String::from)
                .to_vec(),
            allow_headers: [
                "x-csrf-token",
                "x-requested-with",
                "accept",
                "accept-version",
                "content-length",
                "content-md5",
                "content-type",
                "date",
                "x-api-version",
            ]
            .map(String::from)
            .to_vec(),
            allow_credentials: false,
            max_age: 86_400,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive in `EnvFilter` syntax, e.g. `"info,scoreboard=debug"`.
    pub level: String,
    pub format: LogFormat,
    /// `"stdout"`, `"stderr"`, or a file path to append to.
    pub output: String,
    /// ANSI colours (text format on a terminal only).
    pub color: bool,
    /// Include the event target.
    pub target: bool,
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Text,
            output: "stderr".into(),
            color: true,
            target: true,
            timestamps: true,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().display().to_string(), e))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    /// Get the socket address string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.bind, self.server.port)
    }
}

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}': {1}")]
    Io(String, #[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}
