//! Write Order Module
//!
//! Tracks entries by write time so the cache can evict the oldest one.

use std::collections::BTreeMap;

// == Write Order ==
/// Index of keys ordered by `(stored_at, seq)`.
///
/// `seq` is a per-cache write counter, so two writes in the same millisecond
/// still have a defined order. The first key in the map is the eviction
/// candidate.
#[derive(Debug, Default)]
pub struct WriteOrder {
    order: BTreeMap<(u64, u64), String>,
}

impl WriteOrder {
    // == Constructor ==
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    // == Insert ==
    /// Records `key` as written at `stored_at` with sequence `seq`.
    pub fn insert(&mut self, stored_at: u64, seq: u64, key: &str) {
        self.order.insert((stored_at, seq), key.to_string());
    }

    // == Remove ==
    /// Forgets the write recorded at `(stored_at, seq)`.
    pub fn remove(&mut self, stored_at: u64, seq: u64) {
        self.order.remove(&(stored_at, seq));
    }

    // == Pop Oldest ==
    /// Removes and returns the key with the oldest write.
    pub fn pop_oldest(&mut self) -> Option<String> {
        self.order.pop_first().map(|(_, key)| key)
    }

    // == Peek Oldest ==
    /// Returns the key with the oldest write without removing it.
    #[cfg(test)]
    pub fn peek_oldest(&self) -> Option<&str> {
        self.order.values().next().map(String::as_str)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }
}
