//! Configuration module for the blog API.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_env_value(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError {
                key: "BLOG_LOG_FORMAT",
                message: format!("expected `pretty` or `json`, got `{}`", other),
            }),
        }
    }
}

/// Configuration that could not be parsed.
#[derive(Debug)]
pub struct ConfigError {
    pub key: &'static str,
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}: {}", self.key, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Deployment mode shown in the startup banner
    pub mode: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log line format
    pub log_format: LogFormat,
    /// JSON file with the post collection; the bundled seed data is used when unset
    pub data_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let bind_addr = env::var("BLOG_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError {
                key: "BLOG_BIND_ADDR",
                message: e.to_string(),
            })?;

        let mode = env::var("BLOG_MODE").unwrap_or_else(|_| "development".to_string());

        let log_level = env::var("BLOG_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_format = match env::var("BLOG_LOG_FORMAT") {
            Ok(value) => LogFormat::from_env_value(&value)?,
            Err(_) => LogFormat::Pretty,
        };

        let data_path = env::var("BLOG_DATA_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            bind_addr,
            mode,
            log_level,
            log_format,
            data_path,
        })
    }
}
