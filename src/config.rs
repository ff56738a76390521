//! Configuration module for sitewatch.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Ceiling applied to every target interval (about 136 years).
pub const MAX_INTERVAL_SECS: u64 = u32::MAX as u64;

/// Settings that shape the monitoring core.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Interval used when none (or garbage) is supplied for a target.
    pub default_interval_secs: u64,
    /// Floor applied to every target interval.
    pub min_interval_secs: u64,
    /// Timeout for a single probe request.
    pub probe_timeout: Duration,
    /// Number of history entries retained per target.
    pub history_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            default_interval_secs: 60,
            min_interval_secs: 10,
            probe_timeout: Duration::from_secs(10),
            history_capacity: 50,
        }
    }
}

impl MonitorConfig {
    /// Normalize a requested check interval.
    ///
    /// Missing values fall back to the default, everything else is clamped
    /// to the minimum and to [`MAX_INTERVAL_SECS`].
    pub fn normalize_interval(&self, requested: Option<i64>) -> u64 {
        let secs = match requested {
            None => self.default_interval_secs.max(self.min_interval_secs),
            Some(secs) if secs < self.min_interval_secs as i64 => self.min_interval_secs,
            Some(secs) => secs as u64,
        };
        secs.min(MAX_INTERVAL_SECS)
    }
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP port for the web server (default: 5000)
    pub http_port: u16,
    pub monitor: MonitorConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 5000,
            monitor: MonitorConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SITEWATCH_HTTP_PORT`: HTTP port (default: 5000)
    /// - `SITEWATCH_DEFAULT_CHECK_INTERVAL`: seconds between checks (default: 60)
    /// - `SITEWATCH_MIN_CHECK_INTERVAL`: lower bound for intervals (default: 10)
    /// - `SITEWATCH_REQUEST_TIMEOUT`: probe timeout in seconds (default: 10)
    /// - `SITEWATCH_HISTORY_CAPACITY`: history entries kept per site (default: 50)
    pub fn load() -> Self {
        let mut cfg = Self::default();

        if let Some(port) = env_parse("SITEWATCH_HTTP_PORT") {
            cfg.http_port = port;
        }
        if let Some(secs) = env_parse("SITEWATCH_DEFAULT_CHECK_INTERVAL") {
            cfg.monitor.default_interval_secs = secs;
        }
        if let Some(secs) = env_parse("SITEWATCH_MIN_CHECK_INTERVAL") {
            cfg.monitor.min_interval_secs = secs;
        }
        if let Some(secs) = env_parse::<u64>("SITEWATCH_REQUEST_TIMEOUT") {
            if secs > 0 {
                cfg.monitor.probe_timeout = Duration::from_secs(secs);
            }
        }
        if let Some(capacity) = env_parse::<usize>("SITEWATCH_HISTORY_CAPACITY") {
            if capacity > 0 {
                cfg.monitor.history_capacity = capacity;
            }
        }

        cfg
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Ignoring invalid value for {}: {:?}", key, raw);
            None
        }
    }
}
