//! Message Store Module
//!
//! In-memory store for message content, guarded by a single lock.

use tokio::sync::RwLock;

use crate::buffer::{BoundedStore, BufferStats, CleanupReport, Entry};
use crate::error::Result;

// == Message Store ==
/// Bounded store whose payload is the message itself.
///
/// Reads share the lock; every mutation holds it exclusively.
#[derive(Debug)]
pub struct MessageStore<M> {
    index: RwLock<BoundedStore<M>>,
}

impl<M> MessageStore<M>
where
    M: Clone + Send + Sync,
{
    // == Constructor ==
    pub fn new(index: BoundedStore<M>) -> Self {
        Self {
            index: RwLock::new(index),
        }
    }

    /// Creates a store with default collaborators.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Ok(Self::new(BoundedStore::new(capacity)?))
    }

    /// Stores a message, evicting the oldest one if full.
    pub async fn add(&self, content: M) -> Result<String> {
        self.index.write().await.add(content)
    }

    pub async fn get(&self, id: &str) -> Option<Entry<M>> {
        self.index.read().await.get(id).cloned()
    }

    /// Every stored message, oldest first.
    pub async fn get_all(&self) -> Vec<Entry<M>> {
        self.index.read().await.get_all()
    }

    pub async fn remove(&self, id: &str) -> bool {
        self.index.write().await.remove(id)
    }

    /// Drops messages stamped before `cutoff`. In-memory removal cannot
    /// fail, so the report never lists failures.
    pub async fn cleanup(&self, cutoff: u64) -> CleanupReport {
        let removed = self.index.write().await.cleanup(cutoff);
        CleanupReport {
            removed,
            failed: Vec::new(),
        }
    }

    pub async fn len(&self) -> usize {
        self.index.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.index.read().await.is_empty()
    }

    pub async fn stats(&self) -> BufferStats {
        self.index.read().await.stats()
    }
}
