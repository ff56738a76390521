//! Check coordination: probe a target and record the outcome.

use crate::metrics::MetricsSink;
use crate::probe::{probe, ProbeResult};
use crate::state::Store;

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

/// Runs one check for a target and records it.
///
/// The store lock is released for the duration of the network call, so a
/// slow site never holds up reads or checks of other targets.
#[derive(Clone)]
pub struct Checker {
    store: Arc<Store>,
    metrics: Arc<dyn MetricsSink>,
    timeout: Duration,
}

impl Checker {
    pub fn new(store: Arc<Store>, metrics: Arc<dyn MetricsSink>, timeout: Duration) -> Self {
        Self {
            store,
            metrics,
            timeout,
        }
    }

    /// Probe target `id` once and record the result.
    ///
    /// Returns `false` when the target does not exist, either up front or
    /// because it was deleted while the probe was in flight. In that case
    /// nothing is recorded.
    pub async fn check(&self, id: u64) -> bool {
        let address = match self.store.get_target(id) {
            Some(target) => target.address,
            None => {
                tracing::debug!("Check skipped, target {} not found", id);
                return false;
            }
        };

        let result = probe(&address, self.timeout).await;

        // Existence is re-validated under the same write lock that applies
        // the result, so the state fields and the history entry land together.
        let recorded = self.store.record_check(
            id,
            result.status.clone(),
            result.response_time,
            Utc::now(),
        );
        if recorded.is_none() {
            tracing::debug!("Target {} deleted during check, discarding result", id);
            return false;
        }

        tracing::debug!(
            "Checked {} ({}): {} in {}ms",
            id,
            address,
            result.status,
            result.response_time
        );
        self.report(&address, &result);
        true
    }

    fn report(&self, address: &str, result: &ProbeResult) {
        self.metrics
            .record_attempt(address, &result.status.metric_label());
        if result.completed() {
            self.metrics
                .record_latency(address, result.response_time / 1000.0);
        }
        self.metrics.record_up(address, result.status.is_up());
    }
}
