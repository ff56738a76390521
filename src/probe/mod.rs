//! Probe module for site monitoring.
//!
//! A probe performs one HTTP check and classifies the outcome. Failures to
//! complete the exchange are reported as a [`CheckStatus::Failed`] value,
//! never as an error to the caller.

mod http;

pub use http::*;

use crate::state::CheckStatus;

use std::time::Duration;
use thiserror::Error;

/// Timeout applied when the caller has no better value.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Probe error types.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Classified outcome of one probe.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub status: CheckStatus,
    /// Milliseconds, rounded to two decimals. Zero when the exchange failed.
    pub response_time: f64,
}

impl ProbeResult {
    fn from_response(response: HttpResponse) -> Self {
        let status = if response.is_success() {
            CheckStatus::Ok(response.status_code)
        } else {
            CheckStatus::HttpError(response.status_code)
        };
        Self {
            status,
            response_time: round_ms(response.elapsed),
        }
    }

    fn from_error(err: &ProbeError) -> Self {
        Self {
            status: CheckStatus::Failed(err.to_string()),
            response_time: 0.0,
        }
    }

    /// Whether the exchange completed, regardless of the status code.
    pub fn completed(&self) -> bool {
        matches!(self.status, CheckStatus::Ok(_) | CheckStatus::HttpError(_))
    }
}

/// Probe `address` once.
pub async fn probe(address: &str, timeout: Duration) -> ProbeResult {
    match run_http_probe(address, timeout).await {
        Ok(response) => ProbeResult::from_response(response),
        Err(e) => {
            tracing::warn!("Error checking {}: {}", address, e);
            ProbeResult::from_error(&e)
        }
    }
}

fn round_ms(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 100_000.0).round() / 100.0
}
