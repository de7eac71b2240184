//! Bounded Store Module
//!
//! Capacity-limited keyed store combining HashMap storage with FIFO
//! insertion order and age-based cleanup. No I/O.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::buffer::{
    BufferStats, Clock, Entry, IdGenerator, InsertionOrder, SystemClock, UuidGenerator,
};
use crate::error::{Result, UndoError};

// == Bounded Store ==
/// Keyed store that never holds more than `capacity` entries.
///
/// When full, inserting drops the oldest-inserted entry first.
pub struct BoundedStore<T> {
    /// Id → entry
    entries: HashMap<String, Entry<T>>,
    /// Eviction order
    order: InsertionOrder,
    /// Removal counters
    stats: BufferStats,
    /// Maximum number of entries allowed
    capacity: usize,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl<T> BoundedStore<T> {
    // == Constructor ==
    /// Creates a store using the system clock and UUID ids.
    ///
    /// # Errors
    /// `InvalidCapacity` if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_collaborators(
            capacity,
            Arc::new(SystemClock::new()),
            Arc::new(UuidGenerator),
        )
    }

    /// Creates a store with an explicit clock and id generator.
    pub fn with_collaborators(
        capacity: usize,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Result<Self> {
        if capacity == 0 {
            return Err(UndoError::InvalidCapacity(capacity));
        }

        Ok(Self {
            entries: HashMap::new(),
            order: InsertionOrder::new(),
            stats: BufferStats::new(capacity),
            capacity,
            clock,
            ids,
        })
    }

    // == Add ==
    /// Stores a payload under a fresh id stamped with the current time.
    ///
    /// If the store is at capacity the oldest entry is evicted first.
    pub fn add(&mut self, payload: T) -> Result<String> {
        let id = self.mint_id();
        let entry = Entry::new(id.clone(), self.now_ms(), payload);
        self.insert(entry)?;
        Ok(id)
    }

    // == Insert ==
    /// Inserts a pre-built entry, evicting the oldest one if at capacity.
    ///
    /// Returns the evicted entry, if any. Used by wrappers that must mint
    /// the id before the entry can be registered.
    pub fn insert(&mut self, entry: Entry<T>) -> Result<Option<Entry<T>>> {
        if self.entries.contains_key(&entry.id) {
            return Err(UndoError::DuplicateId(entry.id));
        }

        let evicted = if self.entries.len() >= self.capacity {
            self.evict_oldest()
        } else {
            None
        };

        self.order.push_back(&entry.id);
        self.entries.insert(entry.id.clone(), entry);
        self.stats.set_total_entries(self.entries.len());

        Ok(evicted)
    }

    /// Generates an id not yet handed out.
    pub fn mint_id(&self) -> String {
        self.ids.next_id()
    }

    /// Reads the store's clock.
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    // == Get ==
    /// Looks up an entry. Absence is not an error.
    pub fn get(&self, id: &str) -> Option<&Entry<T>> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    // == Iteration ==
    /// Iterates entries oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Entry<T>> + '_ {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    /// Snapshot of every entry, oldest first.
    pub fn get_all(&self) -> Vec<Entry<T>>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }

    /// Returns the next eviction victim without removing it.
    pub fn oldest(&self) -> Option<&Entry<T>> {
        self.order.front().and_then(|id| self.entries.get(id))
    }

    // == Remove ==
    /// Removes an entry. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        self.take(id).is_some()
    }

    /// Removes an entry and hands it back.
    pub fn take(&mut self, id: &str) -> Option<Entry<T>> {
        let entry = self.detach(id)?;
        self.stats.record_removal();
        Some(entry)
    }

    // == Evict Oldest ==
    /// Removes the oldest entry. An empty store yields None.
    pub fn evict_oldest(&mut self) -> Option<Entry<T>> {
        let id = self.order.pop_front()?;
        let entry = self.detach(&id)?;
        self.stats.record_eviction();
        Some(entry)
    }

    // == Cleanup ==
    /// Ids of entries stamped before `cutoff`, oldest first.
    pub fn expired_ids(&self, cutoff: u64) -> Vec<String> {
        self.iter()
            .filter(|entry| entry.is_older_than(cutoff))
            .map(|entry| entry.id.clone())
            .collect()
    }

    /// Removes a single entry as part of a sweep.
    pub fn expire(&mut self, id: &str) -> Option<Entry<T>> {
        let entry = self.detach(id)?;
        self.stats.record_expired(1);
        Some(entry)
    }

    /// Removes every entry stamped before `cutoff` and returns their ids.
    /// Entries stamped exactly at `cutoff` are kept.
    pub fn cleanup(&mut self, cutoff: u64) -> Vec<String> {
        let expired = self.expired_ids(cutoff);
        for id in &expired {
            self.expire(id);
        }
        expired
    }

    // == Accessors ==
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns current statistics.
    pub fn stats(&self) -> BufferStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    fn detach(&mut self, id: &str) -> Option<Entry<T>> {
        let entry = self.entries.remove(id)?;
        self.order.remove(id);
        self.stats.set_total_entries(self.entries.len());
        Some(entry)
    }
}

impl<T: fmt::Debug> fmt::Debug for BoundedStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedStore")
            .field("capacity", &self.capacity)
            .field("entries", &self.iter().collect::<Vec<_>>())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
