//! Insertion Order Module
//!
//! Tracks FIFO order of keys for capacity eviction.

use std::collections::HashMap;

// == Link ==
#[derive(Debug, Clone, Default)]
struct Link {
    prev: Option<String>,
    next: Option<String>,
}

// == Insertion Order ==
/// Doubly-linked list of keys threaded through a hash map.
///
/// - Front = oldest inserted
/// - Back = newest inserted
///
/// Push, pop and removal of an arbitrary key are all O(1).
#[derive(Debug, Default)]
pub struct InsertionOrder {
    links: HashMap<String, Link>,
    head: Option<String>,
    tail: Option<String>,
}

impl InsertionOrder {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Push Back ==
    /// Appends a key as the newest. Returns false if it is already tracked.
    pub fn push_back(&mut self, key: &str) -> bool {
        if self.links.contains_key(key) {
            return false;
        }

        match &self.tail {
            Some(tail) => {
                if let Some(link) = self.links.get_mut(tail) {
                    link.next = Some(key.to_string());
                }
            }
            None => self.head = Some(key.to_string()),
        }

        self.links.insert(
            key.to_string(),
            Link {
                prev: self.tail.take(),
                next: None,
            },
        );
        self.tail = Some(key.to_string());
        true
    }

    // == Remove ==
    /// Unlinks a key. Returns false if it was not tracked.
    pub fn remove(&mut self, key: &str) -> bool {
        let Some(link) = self.links.remove(key) else {
            return false;
        };

        match &link.prev {
            Some(prev) => {
                if let Some(prev_link) = self.links.get_mut(prev) {
                    prev_link.next = link.next.clone();
                }
            }
            None => self.head = link.next.clone(),
        }

        match &link.next {
            Some(next) => {
                if let Some(next_link) = self.links.get_mut(next) {
                    next_link.prev = link.prev.clone();
                }
            }
            None => self.tail = link.prev.clone(),
        }

        true
    }

    // == Pop Front ==
    /// Returns and removes the oldest key, or None if empty.
    pub fn pop_front(&mut self) -> Option<String> {
        let head = self.head.clone()?;
        self.remove(&head);
        Some(head)
    }

    // == Front ==
    /// Returns the oldest key without removing it.
    pub fn front(&self) -> Option<&str> {
        self.head.as_deref()
    }

    // == Iter ==
    /// Iterates keys oldest first.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            order: self,
            cursor: self.head.as_deref(),
        }
    }
}

/// Oldest-first iterator over an [`InsertionOrder`].
pub struct Iter<'a> {
    order: &'a InsertionOrder,
    cursor: Option<&'a str>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.cursor?;
        self.cursor = self
            .order
            .links
            .get(key)
            .and_then(|link| link.next.as_deref());
        Some(key)
    }
}
