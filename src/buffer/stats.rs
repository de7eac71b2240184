//! Buffer Statistics Module
//!
//! Tracks how entries leave a store: eviction, explicit removal, or expiry.

use serde::Serialize;

// == Buffer Stats ==
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BufferStats {
    /// Entries dropped to make room for a newer one
    pub evictions: u64,
    /// Entries dropped by an explicit remove
    pub removals: u64,
    /// Entries dropped by a cleanup sweep
    pub expired: u64,
    /// Current number of entries in the store
    pub total_entries: usize,
    /// Maximum number of entries the store holds
    pub capacity: usize,
}

impl BufferStats {
    // == Constructor ==
    /// Creates stats for an empty store of the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    // == Utilization ==
    /// Fraction of capacity in use, 0.0 for a zero-capacity snapshot.
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.total_entries as f64 / self.capacity as f64
        }
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_removal(&mut self) {
        self.removals += 1;
    }

    pub fn record_expired(&mut self, count: usize) {
        self.expired += count as u64;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
