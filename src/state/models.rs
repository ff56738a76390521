//! Monitoring model types.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

/// Classified result of the most recent probe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CheckStatus {
    /// No probe has completed yet.
    #[default]
    Unknown,
    /// The exchange completed with a success status code.
    Ok(u16),
    /// The exchange completed with a client or server error status code.
    HttpError(u16),
    /// The exchange could not be completed.
    Failed(String),
}

impl CheckStatus {
    /// Whether this status counts towards uptime.
    pub fn is_up(&self) -> bool {
        matches!(self, CheckStatus::Ok(_))
    }

    /// Label used for the `status` dimension of the request counter.
    pub fn metric_label(&self) -> String {
        match self {
            CheckStatus::Unknown => "unknown".to_string(),
            CheckStatus::Ok(code) | CheckStatus::HttpError(code) => code.to_string(),
            CheckStatus::Failed(_) => "error".to_string(),
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Unknown => write!(f, "Unknown"),
            CheckStatus::Ok(code) => write!(f, "OK ({})", code),
            CheckStatus::HttpError(code) => write!(f, "Error ({})", code),
            CheckStatus::Failed(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl Serialize for CheckStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A monitored endpoint and its last observed state.
#[derive(Debug, Clone, Serialize)]
pub struct Target {
    pub id: u64,
    #[serde(rename = "url")]
    pub address: String,
    pub name: String,
    pub check_interval: u64,
    pub status: CheckStatus,
    /// Milliseconds, 0 when never measured or the last probe failed.
    pub response_time: f64,
    pub last_checked: Option<DateTime<Utc>>,
}

/// One probe outcome as recorded in a target's history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub status: CheckStatus,
    pub response_time: f64,
}

/// Fields an update may change. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct TargetUpdate {
    pub address: Option<String>,
    pub name: Option<String>,
    pub check_interval: Option<i64>,
}

/// Result of applying a [`TargetUpdate`].
#[derive(Debug, Clone)]
pub struct TargetChange {
    pub target: Target,
    pub address_changed: bool,
    pub interval_changed: bool,
}

impl TargetChange {
    /// Whether the polling loop must be rebuilt for this change.
    pub fn needs_restart(&self) -> bool {
        self.address_changed || self.interval_changed
    }
}
