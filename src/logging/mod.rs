//! Logging setup and named loggers.
//!
//! The subscriber is installed once in `main`. Components do not reach for a
//! global logger; they receive a [`Logger`] handle from the [`LoggerRegistry`]
//! built at startup and carried in `AppState`.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Local;
use tracing::Level;
use tracing_subscriber::fmt::{format::Writer, time::FormatTime};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, LogFormat};

/// Timestamp layout for human-readable log lines, e.g. `07 Mar 2025 14:03:59`.
pub const LOG_TIME_FORMAT: &str = "%d %b %Y %H:%M:%S";

/// Local wall-clock timer for the fmt layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTime;

impl FormatTime for LogTime {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format(LOG_TIME_FORMAT))
    }
}

/// Install the global tracing subscriber.
pub fn init(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_timer(LogTime))
            .init(),
    }
}

/// Request context attached to a log line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogMeta {
    pub url: Option<String>,
    pub ip: Option<String>,
}

/// A named logging handle.
///
/// Cheap to clone. Messages below the handle's level are dropped before they
/// reach the subscriber.
#[derive(Debug, Clone)]
pub struct Logger {
    name: Arc<str>,
    level: Level,
}

impl Logger {
    pub fn new(name: &str, level: Level) -> Self {
        Self {
            name: Arc::from(name),
            level,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// Whether a message at `level` passes this handle's threshold.
    pub fn enabled(&self, level: Level) -> bool {
        // tracing orders levels by verbosity: TRACE > DEBUG > ... > ERROR
        level <= self.level
    }

    /// Emit `message` at `level`, with optional request context.
    pub fn log(&self, level: Level, message: &str, meta: Option<&LogMeta>) {
        if !self.enabled(level) {
            return;
        }

        let name = &*self.name;
        let meta = meta.cloned().unwrap_or_default();
        let url = meta.url.as_deref().unwrap_or_default();
        let ip = meta.ip.as_deref().unwrap_or_default();

        match level {
            Level::ERROR => tracing::error!(logger = name, url, ip, "{}", message),
            Level::WARN => tracing::warn!(logger = name, url, ip, "{}", message),
            Level::INFO => tracing::info!(logger = name, url, ip, "{}", message),
            Level::DEBUG => tracing::debug!(logger = name, url, ip, "{}", message),
            Level::TRACE => tracing::trace!(logger = name, url, ip, "{}", message),
        }
    }

    pub fn info(&self, message: &str) {
        self.log(Level::INFO, message, None);
    }

    pub fn error(&self, message: &str) {
        self.log(Level::ERROR, message, None);
    }
}

/// Get-or-create cache of named loggers.
#[derive(Debug)]
pub struct LoggerRegistry {
    default_level: Level,
    loggers: RwLock<HashMap<String, Logger>>,
}

impl LoggerRegistry {
    pub fn new(default_level: Level) -> Self {
        Self {
            default_level,
            loggers: RwLock::new(HashMap::new()),
        }
    }

    /// Build a registry whose default level follows the configured log level.
    pub fn from_config(config: &Config) -> Self {
        Self::new(parse_level(&config.log_level).unwrap_or(Level::INFO))
    }

    /// Return the logger called `name`, creating it at `level` if missing.
    ///
    /// An existing logger keeps the level it was created with.
    pub fn create(&self, name: &str, level: Level) -> Logger {
        if let Some(logger) = self.lookup(name) {
            return logger;
        }

        let mut loggers = self.loggers.write().unwrap_or_else(|e| e.into_inner());
        loggers
            .entry(name.to_string())
            .or_insert_with(|| Logger::new(name, level))
            .clone()
    }

    /// Return the logger called `name`, creating it at the default level.
    pub fn get(&self, name: &str) -> Logger {
        self.create(name, self.default_level)
    }

    pub fn len(&self) -> usize {
        self.loggers.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn lookup(&self, name: &str) -> Option<Logger> {
        self.loggers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }
}

/// Parse a plain level name such as `info` or `WARN`.
pub fn parse_level(value: &str) -> Option<Level> {
    value.trim().parse().ok()
}
