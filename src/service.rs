//! Monitoring service: the operations the web layer calls.

use crate::checker::Checker;
use crate::config::MonitorConfig;
use crate::metrics::MetricsSink;
use crate::scheduler::{Scheduler, SupervisorState};
use crate::state::{HistoryEntry, Store, Target, TargetUpdate};

use std::sync::Arc;

/// Ties together the store, the checker and the scheduler.
///
/// Adding or updating a target checks it right away before (re)starting its
/// polling loop, so callers always get back a target with a fresh status.
pub struct Monitor {
    store: Arc<Store>,
    checker: Checker,
    scheduler: Scheduler,
}

impl Monitor {
    pub fn new(config: &MonitorConfig, metrics: Arc<dyn MetricsSink>) -> Self {
        let store = Arc::new(Store::new(config));
        let checker = Checker::new(store.clone(), metrics, config.probe_timeout);
        let scheduler = Scheduler::new(store.clone(), checker.clone());
        Self {
            store,
            checker,
            scheduler,
        }
    }

    /// Register a target, check it once and start polling it.
    pub async fn add_target(
        &self,
        address: String,
        name: Option<String>,
        interval: Option<i64>,
    ) -> Target {
        let target = self.store.add_target(address, name, interval);
        tracing::info!(
            "Added site {} ({}) every {}s",
            target.id,
            target.address,
            target.check_interval
        );

        self.checker.check(target.id).await;
        self.scheduler.add_target(target.id).await;

        // Deleted while we were checking it.
        if !self.store.contains(target.id) {
            self.scheduler.remove_target(target.id).await;
        }

        self.store.get_target(target.id).unwrap_or(target)
    }

    pub fn get_target(&self, id: u64) -> Option<Target> {
        self.store.get_target(id)
    }

    pub fn list_targets(&self) -> Vec<Target> {
        self.store.get_targets()
    }

    /// Apply an update and re-check the target.
    ///
    /// The polling loop is rebuilt when the address or interval changed.
    pub async fn update_target(&self, id: u64, update: TargetUpdate) -> Option<Target> {
        let change = self.store.update_target(id, update)?;
        tracing::info!("Updated site {}", id);

        self.checker.check(id).await;
        if change.needs_restart() && self.store.contains(id) {
            self.scheduler.restart_target(id).await;
        }

        self.store.get_target(id)
    }

    /// Forget a target: its state, its history and its polling loop.
    pub async fn delete_target(&self, id: u64) -> bool {
        let removed = self.store.delete_target(id);
        self.scheduler.remove_target(id).await;
        if removed {
            tracing::info!("Deleted site {}", id);
        }
        removed
    }

    /// Check a target right now, outside its schedule.
    pub async fn trigger_check(&self, id: u64) -> Option<Target> {
        if !self.checker.check(id).await {
            return None;
        }
        self.store.get_target(id)
    }

    /// Up to `limit` history entries, newest first.
    pub fn get_history(&self, id: u64, limit: usize) -> Vec<HistoryEntry> {
        self.store.get_history(id, limit)
    }

    /// Uptime percentage over the stored history, rounded to two decimals.
    pub fn get_uptime(&self, id: u64) -> Option<f64> {
        self.store
            .uptime_ratio(id)
            .map(|ratio| (ratio * 10_000.0).round() / 100.0)
    }

    pub async fn polling_state(&self, id: u64) -> Option<SupervisorState> {
        self.scheduler.state(id).await
    }

    /// Stop all polling loops.
    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
    }
}
