//! Keyed Cache Module
//!
//! Main cache engine combining HashMap storage with write-order tracking and
//! TTL expiration.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use regex::Regex;
use tracing::{debug, warn};

use crate::cache::stats::Counters;
use crate::cache::{CacheEntry, CacheStats, WriteOrder};
use crate::clock::Clock;
use crate::error::{CacheError, Result};

/// Estimates the number of bytes a value occupies, for [`CacheStats::memory_usage`].
pub type Weigher<V> = fn(&str, &V) -> usize;

fn default_weigher<V>(_key: &str, _value: &V) -> usize {
    std::mem::size_of::<V>()
}

// == Keyed Cache ==
/// Bounded key-value store with per-entry TTL.
///
/// Expired entries are logically absent: reads never return them, and they
/// are removed lazily on read, by [`KeyedCache::cleanup`], or before an
/// insert at capacity. When the cache is still full after a sweep, the entry
/// with the oldest write is evicted.
///
/// Methods take `&mut self`; share an instance behind
/// `Arc<tokio::sync::RwLock<_>>`.
pub struct KeyedCache<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Eviction order by write time
    order: WriteOrder,
    /// Hit/miss/eviction counters
    counters: Counters,
    /// Maximum number of entries allowed
    max_size: usize,
    /// TTL in milliseconds for writes that do not pass one
    default_ttl_ms: u64,
    clock: Arc<dyn Clock>,
    weigher: Weigher<V>,
    next_seq: u64,
}

impl<V> fmt::Debug for KeyedCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedCache")
            .field("len", &self.entries.len())
            .field("max_size", &self.max_size)
            .field("default_ttl_ms", &self.default_ttl_ms)
            .field("counters", &self.counters)
            .field("clock", &self.clock)
            .finish()
    }
}

impl<V> KeyedCache<V> {
    // == Constructor ==
    /// Creates an empty cache.
    ///
    /// # Arguments
    /// * `max_size` - Maximum number of entries the cache can hold
    /// * `default_ttl_ms` - TTL for entries written without an explicit one
    /// * `clock` - Time source for `stored_at` and expiry checks
    pub fn new(max_size: usize, default_ttl_ms: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            order: WriteOrder::new(),
            counters: Counters::default(),
            max_size,
            default_ttl_ms,
            clock,
            weigher: default_weigher::<V>,
            next_seq: 0,
        }
    }

    /// Replaces the size estimator used for `memory_usage`.
    pub fn with_weigher(mut self, weigher: Weigher<V>) -> Self {
        self.weigher = weigher;
        self
    }

    // == Set ==
    /// Stores `value` under `key`, replacing any previous entry.
    ///
    /// At capacity, expired entries are swept first; if the cache is still
    /// full the oldest write is evicted. A cache with `max_size == 0` stores
    /// nothing.
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl_ms: Option<u64>) {
        let key = key.into();
        let now = self.clock.now_ms();
        let ttl = ttl_ms.unwrap_or(self.default_ttl_ms);
        let seq = self.bump_seq();

        // Overwrite keeps the slot, so it never evicts
        if let Some(entry) = self.entries.get_mut(&key) {
            self.order.remove(entry.stored_at, entry.seq);
            *entry = CacheEntry::new(value, now, ttl, seq);
            self.order.insert(now, seq, &key);
            return;
        }

        if self.entries.len() >= self.max_size {
            let swept = self.cleanup();
            debug!(swept, "cache at capacity, swept expired entries");

            while self.entries.len() >= self.max_size {
                match self.order.pop_oldest() {
                    Some(oldest) => {
                        self.entries.remove(&oldest);
                        self.counters.record_eviction();
                        debug!(key = %oldest, "evicted oldest entry");
                    }
                    None => {
                        warn!(key = %key, max_size = self.max_size, "cache has no capacity, value not stored");
                        return;
                    }
                }
            }
        }

        self.order.insert(now, seq, &key);
        self.entries.insert(key, CacheEntry::new(value, now, ttl, seq));
    }

    // == Get ==
    /// Returns a clone of the live value under `key`.
    ///
    /// An expired entry is removed on the spot and reported as absent.
    pub fn get(&mut self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        let now = self.clock.now_ms();
        let expired = self.entries.get(key).map(|entry| entry.is_expired(now));

        match expired {
            Some(false) => {
                self.counters.record_hit();
                self.entries.get(key).map(|entry| entry.value.clone())
            }
            Some(true) => {
                self.remove_entry(key);
                self.counters.record_expirations(1);
                self.counters.record_miss();
                None
            }
            None => {
                self.counters.record_miss();
                None
            }
        }
    }

    // == Has ==
    /// Returns true if `key` holds a live entry. Same side effects as [`get`](Self::get).
    pub fn has(&mut self, key: &str) -> bool
    where
        V: Clone,
    {
        self.get(key).is_some()
    }

    // == Delete ==
    /// Removes `key`, returning whether an entry was present.
    pub fn delete(&mut self, key: &str) -> bool {
        self.remove_entry(key).is_some()
    }

    // == Clear ==
    /// Removes every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    // == Get Or Set ==
    /// Returns the cached value, or runs `fetcher` once on a miss and caches
    /// its result.
    ///
    /// A failing `fetcher` leaves the cache untouched and its error is
    /// returned as-is.
    pub async fn get_or_set<F, Fut, E>(
        &mut self,
        key: &str,
        fetcher: F,
        ttl_ms: Option<u64>,
    ) -> std::result::Result<V, E>
    where
        V: Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<V, E>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        let value = fetcher().await?;
        self.set(key, value.clone(), ttl_ms);
        Ok(value)
    }

    // == Invalidate Pattern ==
    /// Removes every key matching the regular expression `pattern`.
    ///
    /// Returns the number of removed entries, or
    /// [`CacheError::InvalidPattern`] if the pattern does not compile.
    pub fn invalidate_pattern(&mut self, pattern: &str) -> Result<usize> {
        let regex = Regex::new(pattern).map_err(|e| CacheError::invalid_pattern(pattern, e))?;

        let matching: Vec<String> = self
            .entries
            .keys()
            .filter(|key| regex.is_match(key))
            .cloned()
            .collect();

        for key in &matching {
            self.remove_entry(key);
        }

        debug!(pattern, removed = matching.len(), "invalidated keys by pattern");
        Ok(matching.len())
    }

    // == Touch ==
    /// Restarts the lifetime of a live entry, optionally with a new TTL.
    ///
    /// Returns false if `key` is absent or already expired (an expired entry
    /// is removed).
    pub fn touch(&mut self, key: &str, ttl_ms: Option<u64>) -> bool {
        let now = self.clock.now_ms();
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(now),
            None => return false,
        };

        if expired {
            self.remove_entry(key);
            self.counters.record_expirations(1);
            return false;
        }

        let seq = self.bump_seq();
        if let Some(entry) = self.entries.get_mut(key) {
            self.order.remove(entry.stored_at, entry.seq);
            entry.refresh(now, ttl_ms, seq);
            self.order.insert(now, seq, key);
        }
        true
    }

    // == Cleanup ==
    /// Removes all expired entries, returning how many were removed.
    pub fn cleanup(&mut self) -> usize {
        let now = self.clock.now_ms();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove_entry(key);
        }

        self.counters.record_expirations(expired.len());
        expired.len()
    }

    // == Stats ==
    /// Returns a diagnostic snapshot.
    pub fn stats(&self) -> CacheStats {
        let memory_usage = self
            .entries
            .iter()
            .map(|(key, entry)| key.len() + (self.weigher)(key, &entry.value))
            .sum();

        CacheStats::from_counters(self.counters, self.entries.len(), self.max_size, memory_usage)
    }

    // == Keys ==
    /// Returns every stored key, including expired ones not yet swept.
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Returns the number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn default_ttl_ms(&self) -> u64 {
        self.default_ttl_ms
    }

    /// Remaining lifetime of `key` in milliseconds, without side effects.
    pub fn ttl_remaining_ms(&self, key: &str) -> Option<u64> {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.ttl_remaining_ms(now))
    }

    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.order.remove(entry.stored_at, entry.seq);
        Some(entry)
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}
