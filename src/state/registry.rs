//! Target registry.

use std::collections::HashMap;

use super::models::*;
use crate::config::MonitorConfig;

/// Authoritative set of monitored targets, keyed by id.
///
/// Ids come from a monotonic counter and are never handed out twice, even
/// after the target holding one is deleted.
#[derive(Debug)]
pub struct Registry {
    targets: HashMap<u64, Target>,
    next_id: u64,
    config: MonitorConfig,
}

impl Registry {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            targets: HashMap::new(),
            next_id: 1,
            config,
        }
    }

    /// Register a new target. It starts out `Unknown` and unchecked.
    pub fn create(&mut self, address: String, name: Option<String>, interval: Option<i64>) -> Target {
        let id = self.next_id;
        self.next_id += 1;

        let name = match name {
            Some(n) if !n.trim().is_empty() => n,
            _ => address.clone(),
        };

        let target = Target {
            id,
            address,
            name,
            check_interval: self.config.normalize_interval(interval),
            status: CheckStatus::Unknown,
            response_time: 0.0,
            last_checked: None,
        };
        self.targets.insert(id, target.clone());
        target
    }

    pub fn get(&self, id: u64) -> Option<&Target> {
        self.targets.get(&id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut Target> {
        self.targets.get_mut(&id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.targets.contains_key(&id)
    }

    /// Snapshot of all targets, ordered by id.
    pub fn list(&self) -> Vec<Target> {
        let mut targets: Vec<Target> = self.targets.values().cloned().collect();
        targets.sort_by_key(|t| t.id);
        targets
    }

    /// Apply the supplied fields. Empty strings count as "not supplied".
    pub fn update(&mut self, id: u64, update: TargetUpdate) -> Option<TargetChange> {
        let interval = update
            .check_interval
            .map(|secs| self.config.normalize_interval(Some(secs)));
        let target = self.targets.get_mut(&id)?;

        let mut address_changed = false;
        if let Some(address) = update.address.filter(|a| !a.trim().is_empty()) {
            address_changed = address != target.address;
            target.address = address;
        }
        if let Some(name) = update.name.filter(|n| !n.trim().is_empty()) {
            target.name = name;
        }

        let mut interval_changed = false;
        if let Some(interval) = interval {
            interval_changed = interval != target.check_interval;
            target.check_interval = interval;
        }

        Some(TargetChange {
            target: target.clone(),
            address_changed,
            interval_changed,
        })
    }

    pub fn delete(&mut self, id: u64) -> bool {
        self.targets.remove(&id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry {
        Registry::new(MonitorConfig::default())
    }

    #[test]
    fn test_create_assigns_increasing_ids() {
        let mut reg = registry();
        let a = reg.create("https://a.example".into(), None, None);
        let b = reg.create("https://b.example".into(), Some("B".into()), Some(30));

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(a.name, "https://a.example");
        assert_eq!(b.name, "B");
        assert_eq!(a.check_interval, 60);
        assert_eq!(b.check_interval, 30);
        assert_eq!(a.status, CheckStatus::Unknown);
        assert!(a.last_checked.is_none());
        assert_eq!(a.response_time, 0.0);
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let mut reg = registry();
        let a = reg.create("https://a.example".into(), None, None);
        assert!(reg.delete(a.id));
        assert!(!reg.delete(a.id));

        let b = reg.create("https://b.example".into(), None, None);
        assert_ne!(a.id, b.id);
        assert!(reg.get(a.id).is_none());
    }

    #[test]
    fn test_interval_floor() {
        let mut reg = registry();
        let t = reg.create("https://a.example".into(), None, Some(3));
        assert_eq!(t.check_interval, 10);
    }

    #[test]
    fn test_update_applies_only_supplied_fields() {
        let mut reg = registry();
        let t = reg.create("https://a.example".into(), Some("A".into()), Some(30));

        let change = reg
            .update(
                t.id,
                TargetUpdate {
                    name: Some("Renamed".into()),
                    address: Some(String::new()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(change.target.name, "Renamed");
        assert_eq!(change.target.address, "https://a.example");
        assert_eq!(change.target.check_interval, 30);
        assert!(!change.needs_restart());

        let change = reg
            .update(
                t.id,
                TargetUpdate {
                    check_interval: Some(5),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(change.target.check_interval, 10);
        assert!(change.interval_changed);
        assert!(change.needs_restart());
    }

    #[test]
    fn test_update_unknown_target() {
        let mut reg = registry();
        assert!(reg.update(42, TargetUpdate::default()).is_none());
    }

    #[test]
    fn test_list_is_ordered_by_id() {
        let mut reg = registry();
        for i in 0..5 {
            reg.create(format!("https://{}.example", i), None, None);
        }
        reg.delete(3);
        let ids: Vec<u64> = reg.list().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 4, 5]);
    }
}
