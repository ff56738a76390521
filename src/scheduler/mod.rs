//! Scheduler module for running periodic checks.
//!
//! Every monitored target gets its own [`Supervisor`]; the scheduler keeps
//! track of them by target id.

mod supervisor;

pub use supervisor::*;

use crate::checker::Checker;
use crate::state::Store;

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Owns one polling supervisor per target.
pub struct Scheduler {
    store: Arc<Store>,
    checker: Checker,
    supervisors: RwLock<HashMap<u64, Supervisor>>,
}

impl Scheduler {
    /// Create a new scheduler with the given store.
    pub fn new(store: Arc<Store>, checker: Checker) -> Self {
        Self {
            store,
            checker,
            supervisors: RwLock::new(HashMap::new()),
        }
    }

    fn spawn_supervisor(&self, id: u64) -> Supervisor {
        let supervisor = Supervisor::new(id, self.store.clone(), self.checker.clone());
        supervisor.start();
        supervisor
    }

    /// Start polling a target. Does nothing if it is already being polled
    /// or no longer exists.
    pub async fn add_target(&self, id: u64) {
        let mut supervisors = self.supervisors.write().await;
        if !self.store.contains(id) {
            return;
        }

        if let Some(existing) = supervisors.get(&id) {
            if existing.state() == SupervisorState::Running {
                return; // Already running
            }
        }

        tracing::info!("Scheduler: Adding target {}", id);
        supervisors.insert(id, self.spawn_supervisor(id));
    }

    /// Replace a target's supervisor with a fresh one.
    ///
    /// A check the old supervisor already has in flight still completes and
    /// is recorded. A target deleted in the meantime is only stopped.
    pub async fn restart_target(&self, id: u64) {
        let mut supervisors = self.supervisors.write().await;

        if let Some(old) = supervisors.remove(&id) {
            old.stop();
        }

        // Deletion removes the target from the store before taking this lock,
        // so checking here cannot miss a concurrent delete.
        if !self.store.contains(id) {
            return;
        }

        tracing::info!("Scheduler: Restarting target {}", id);
        supervisors.insert(id, self.spawn_supervisor(id));
    }

    /// Stop polling a target. Returns `false` if it had no supervisor.
    pub async fn remove_target(&self, id: u64) -> bool {
        let mut supervisors = self.supervisors.write().await;

        match supervisors.remove(&id) {
            Some(supervisor) => {
                supervisor.stop();
                tracing::info!("Scheduler: Removed target {}", id);
                true
            }
            None => false,
        }
    }

    pub async fn state(&self, id: u64) -> Option<SupervisorState> {
        self.supervisors.read().await.get(&id).map(Supervisor::state)
    }

    /// Number of supervisors currently polling.
    pub async fn running(&self) -> usize {
        self.supervisors
            .read()
            .await
            .values()
            .filter(|s| s.state() == SupervisorState::Running)
            .count()
    }

    /// Stop every supervisor and wait for the loops to exit.
    pub async fn shutdown(&self) {
        let drained: Vec<Supervisor> = {
            let mut supervisors = self.supervisors.write().await;
            supervisors.drain().map(|(_, s)| s).collect()
        };

        tracing::info!("Scheduler: Stopping {} supervisors", drained.len());
        for supervisor in &drained {
            supervisor.stop();
        }
        for supervisor in &drained {
            supervisor.join().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitorConfig;
    use crate::metrics::NoopMetrics;
    use std::time::Duration;

    fn scheduler() -> (Arc<Store>, Scheduler) {
        let store = Arc::new(Store::new(&MonitorConfig::default()));
        let checker = Checker::new(store.clone(), Arc::new(NoopMetrics), Duration::from_secs(1));
        (store.clone(), Scheduler::new(store, checker))
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_is_not_duplicated() {
        let (store, scheduler) = scheduler();
        let target = store.add_target("not a url".into(), None, Some(10));

        scheduler.add_target(target.id).await;
        scheduler.add_target(target.id).await;
        assert_eq!(scheduler.running().await, 1);

        tokio::time::sleep(Duration::from_secs(15)).await;
        assert_eq!(store.history_len(target.id), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_target() {
        let (store, scheduler) = scheduler();
        let target = store.add_target("not a url".into(), None, Some(10));

        scheduler.add_target(target.id).await;
        assert!(scheduler.remove_target(target.id).await);
        assert!(!scheduler.remove_target(target.id).await);
        assert!(scheduler.state(target.id).await.is_none());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(store.history_len(target.id), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_replaces_supervisor() {
        let (store, scheduler) = scheduler();
        let target = store.add_target("not a url".into(), None, Some(10));

        scheduler.add_target(target.id).await;
        tokio::time::sleep(Duration::from_secs(5)).await;

        // The fresh supervisor waits a full interval from the restart.
        scheduler.restart_target(target.id).await;
        assert_eq!(scheduler.running().await, 1);

        tokio::time::sleep(Duration::from_secs(8)).await;
        assert_eq!(store.history_len(target.id), 0);

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(store.history_len(target.id), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_of_deleted_target_leaves_no_entry() {
        let (store, scheduler) = scheduler();
        let target = store.add_target("not a url".into(), None, Some(10));
        scheduler.add_target(target.id).await;

        store.delete_target(target.id);
        scheduler.restart_target(target.id).await;
        assert!(scheduler.state(target.id).await.is_none());

        scheduler.add_target(target.id).await;
        assert!(scheduler.state(target.id).await.is_none());
        assert_eq!(scheduler.running().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_scheduler_stops_polling() {
        let (store, scheduler) = scheduler();
        let target = store.add_target("not a url".into(), None, Some(10));
        scheduler.add_target(target.id).await;
        drop(scheduler);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(store.history_len(target.id), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_everything() {
        let (store, scheduler) = scheduler();
        for _ in 0..3 {
            let target = store.add_target("not a url".into(), None, Some(10));
            scheduler.add_target(target.id).await;
        }
        assert_eq!(scheduler.running().await, 3);

        scheduler.shutdown().await;
        assert_eq!(scheduler.running().await, 0);

        tokio::time::sleep(Duration::from_secs(30)).await;
        for target in store.get_targets() {
            assert_eq!(store.history_len(target.id), 0);
        }
    }
}
