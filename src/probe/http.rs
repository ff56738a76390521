//! HTTP probe implementation.

use std::error::Error as _;
use std::time::{Duration, Instant};
use super::ProbeError;

/// A completed HTTP exchange.
#[derive(Debug, Clone, Copy)]
pub struct HttpResponse {
    pub status_code: u16,
    /// Time from sending the request until the body was fully read.
    pub elapsed: Duration,
}

impl HttpResponse {
    /// Anything below 400 counts as success; redirects are followed first.
    pub fn is_success(&self) -> bool {
        self.status_code < 400
    }
}

/// Run an HTTP GET probe against the given URL.
///
/// The address is used as-is; a malformed URL surfaces as an error here.
pub async fn run_http_probe(address: &str, timeout: Duration) -> Result<HttpResponse, ProbeError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ProbeError::Request(describe(&e)))?;

    let start = Instant::now();

    let response = client
        .get(address)
        .send()
        .await
        .map_err(|e| classify(e, timeout))?;

    let status_code = response.status().as_u16();

    // Read the full body to measure complete transfer time
    let _body = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            ProbeError::Timeout(timeout)
        } else {
            ProbeError::Body(describe(&e))
        }
    })?;

    Ok(HttpResponse {
        status_code,
        elapsed: start.elapsed(),
    })
}

fn classify(e: reqwest::Error, timeout: Duration) -> ProbeError {
    if e.is_timeout() {
        ProbeError::Timeout(timeout)
    } else if e.is_builder() {
        ProbeError::InvalidUrl(describe(&e))
    } else if e.is_connect() {
        ProbeError::Connect(describe(&e))
    } else {
        ProbeError::Request(describe(&e))
    }
}

/// reqwest keeps the useful detail in the source chain.
fn describe(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    let mut source = e.source();
    while let Some(inner) = source {
        msg.push_str(": ");
        msg.push_str(&inner.to_string());
        source = inner.source();
    }
    msg
}
