//! Bounded per-target check history.

use std::collections::{HashMap, VecDeque};

use super::models::HistoryEntry;

/// History of probe outcomes per target.
///
/// Entries are stored oldest first; every read hands them back newest first.
#[derive(Debug)]
pub struct Ledger {
    entries: HashMap<u64, VecDeque<HistoryEntry>>,
    capacity: usize,
}

impl Ledger {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Make sure an (empty) ledger exists for `id`.
    pub fn open(&mut self, id: u64) {
        self.entries.entry(id).or_default();
    }

    /// Append an entry, evicting the oldest one once at capacity.
    pub fn append(&mut self, id: u64, entry: HistoryEntry) {
        let capacity = self.capacity;
        let history = self
            .entries
            .entry(id)
            .or_insert_with(|| VecDeque::with_capacity(capacity));
        while history.len() >= capacity {
            history.pop_front();
        }
        history.push_back(entry);
    }

    /// Up to `limit` entries, most recent first.
    pub fn recent(&self, id: u64, limit: usize) -> Vec<HistoryEntry> {
        self.entries
            .get(&id)
            .map(|h| h.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self, id: u64) -> usize {
        self.entries.get(&id).map_or(0, VecDeque::len)
    }

    /// Fraction of stored entries that were successful.
    ///
    /// An empty history counts as fully up.
    pub fn uptime_ratio(&self, id: u64) -> f64 {
        match self.entries.get(&id) {
            Some(h) if !h.is_empty() => {
                let up = h.iter().filter(|e| e.status.is_up()).count();
                up as f64 / h.len() as f64
            }
            _ => 1.0,
        }
    }

    pub fn purge(&mut self, id: u64) {
        self.entries.remove(&id);
    }
}
