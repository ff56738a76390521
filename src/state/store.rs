//! Thread-safe in-memory store for targets and their history.

use chrono::{DateTime, Utc};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::ledger::Ledger;
use super::models::*;
use super::registry::Registry;
use crate::config::MonitorConfig;

struct Inner {
    registry: Registry,
    ledger: Ledger,
}

/// Registry and ledger behind one lock.
///
/// The lock is only ever held for in-memory work, never across an await.
/// Keeping both halves under the same guard is what lets a recorded check
/// update a target and append its history entry as one step.
pub struct Store {
    inner: RwLock<Inner>,
}

impl Store {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            inner: RwLock::new(Inner {
                registry: Registry::new(config.clone()),
                ledger: Ledger::new(config.history_capacity),
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    // --- Target CRUD ---

    /// Register a target together with its empty history.
    pub fn add_target(&self, address: String, name: Option<String>, interval: Option<i64>) -> Target {
        let mut inner = self.write();
        let target = inner.registry.create(address, name, interval);
        inner.ledger.open(target.id);
        target
    }

    pub fn get_target(&self, id: u64) -> Option<Target> {
        self.read().registry.get(id).cloned()
    }

    pub fn get_targets(&self) -> Vec<Target> {
        self.read().registry.list()
    }

    pub fn update_target(&self, id: u64, update: TargetUpdate) -> Option<TargetChange> {
        self.write().registry.update(id, update)
    }

    /// Remove a target and its history.
    pub fn delete_target(&self, id: u64) -> bool {
        let mut inner = self.write();
        let removed = inner.registry.delete(id);
        inner.ledger.purge(id);
        removed
    }

    pub fn contains(&self, id: u64) -> bool {
        self.read().registry.contains(id)
    }

    pub fn check_interval(&self, id: u64) -> Option<u64> {
        self.read().registry.get(id).map(|t| t.check_interval)
    }

    // --- Check results ---

    /// Apply a probe outcome to a target and append it to the history.
    ///
    /// Returns `None` if the target no longer exists, in which case nothing
    /// is written.
    pub fn record_check(
        &self,
        id: u64,
        status: CheckStatus,
        response_time: f64,
        checked_at: DateTime<Utc>,
    ) -> Option<Target> {
        let mut inner = self.write();
        let target = inner.registry.get_mut(id)?;
        target.status = status.clone();
        target.response_time = response_time;
        target.last_checked = Some(checked_at);
        let snapshot = target.clone();

        inner.ledger.append(
            id,
            HistoryEntry {
                timestamp: checked_at,
                status,
                response_time,
            },
        );
        Some(snapshot)
    }

    /// Most recent history entries for a target, newest first.
    pub fn get_history(&self, id: u64, limit: usize) -> Vec<HistoryEntry> {
        self.read().ledger.recent(id, limit)
    }

    pub fn history_len(&self, id: u64) -> usize {
        self.read().ledger.len(id)
    }

    /// Uptime ratio in `[0, 1]`, or `None` for an unknown target.
    pub fn uptime_ratio(&self, id: u64) -> Option<f64> {
        let inner = self.read();
        if !inner.registry.contains(id) {
            return None;
        }
        Some(inner.ledger.uptime_ratio(id))
    }
}
