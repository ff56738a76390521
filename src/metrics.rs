//! Metrics emitted for every check.
//!
//! Recording is fire-and-forget: a sink that fails to record logs and moves
//! on, it never fails the check that produced the sample.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder,
};
use thiserror::Error;

/// Receiver for per-check samples.
pub trait MetricsSink: Send + Sync {
    fn record_attempt(&self, address: &str, status_label: &str);
    fn record_latency(&self, address: &str, seconds: f64);
    fn record_up(&self, address: &str, up: bool);
}

/// Sink that drops every sample.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record_attempt(&self, _address: &str, _status_label: &str) {}
    fn record_latency(&self, _address: &str, _seconds: f64) {}
    fn record_up(&self, _address: &str, _up: bool) {}
}

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
    #[error("exposition is not utf-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Prometheus-backed sink with its own registry.
pub struct PrometheusMetrics {
    registry: Registry,
    requests_total: IntCounterVec,
    response_time_seconds: HistogramVec,
    up: IntGaugeVec,
}

impl PrometheusMetrics {
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("site_monitor_requests_total", "Total site monitor requests"),
            &["site", "status"],
        )?;
        let response_time_seconds = HistogramVec::new(
            HistogramOpts::new(
                "site_monitor_response_time_seconds",
                "Response time in seconds",
            ),
            &["site"],
        )?;
        let up = IntGaugeVec::new(
            Opts::new("site_monitor_up", "Site up status (1 for up, 0 for down)"),
            &["site"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(response_time_seconds.clone()))?;
        registry.register(Box::new(up.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            response_time_seconds,
            up,
        })
    }

    /// Render all metrics in the Prometheus text format.
    pub fn render(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl MetricsSink for PrometheusMetrics {
    fn record_attempt(&self, address: &str, status_label: &str) {
        match self
            .requests_total
            .get_metric_with_label_values(&[address, status_label])
        {
            Ok(counter) => counter.inc(),
            Err(e) => tracing::debug!("Dropping request sample for {}: {}", address, e),
        }
    }

    fn record_latency(&self, address: &str, seconds: f64) {
        match self.response_time_seconds.get_metric_with_label_values(&[address]) {
            Ok(histogram) => histogram.observe(seconds),
            Err(e) => tracing::debug!("Dropping latency sample for {}: {}", address, e),
        }
    }

    fn record_up(&self, address: &str, up: bool) {
        match self.up.get_metric_with_label_values(&[address]) {
            Ok(gauge) => gauge.set(i64::from(up)),
            Err(e) => tracing::debug!("Dropping up sample for {}: {}", address, e),
        }
    }
}
