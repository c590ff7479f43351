//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

// == Cache Entry ==
/// A stored value together with the instant it was written and its lifetime.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Write timestamp (Unix milliseconds), reset by `touch` and re-`set`
    pub stored_at: u64,
    /// Time-to-live in milliseconds
    pub ttl_ms: u64,
    /// Write sequence number, used to order entries written in the same millisecond
    pub seq: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry written at `now`.
    pub fn new(value: V, now: u64, ttl_ms: u64, seq: u64) -> Self {
        Self {
            value,
            stored_at: now,
            ttl_ms,
            seq,
        }
    }

    // == Is Expired ==
    /// Checks whether the entry has outlived its TTL at `now`.
    ///
    /// Boundary condition: an entry whose age equals its TTL is still valid;
    /// only `now - stored_at > ttl_ms` expires it. A clock that moved
    /// backwards yields an age of zero.
    pub fn is_expired(&self, now: u64) -> bool {
        now.saturating_sub(self.stored_at) > self.ttl_ms
    }

    // == Refresh ==
    /// Restarts the entry's lifetime at `now`, optionally with a new TTL.
    pub fn refresh(&mut self, now: u64, ttl_ms: Option<u64>, seq: u64) {
        self.stored_at = now;
        self.seq = seq;
        if let Some(ttl) = ttl_ms {
            self.ttl_ms = ttl;
        }
    }

    // == Time To Live ==
    /// Returns remaining lifetime in milliseconds, `0` once expired.
    pub fn ttl_remaining_ms(&self, now: u64) -> u64 {
        let expires_at = self.stored_at.saturating_add(self.ttl_ms);
        expires_at.saturating_sub(now)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new("test_value", 1_000, 500, 0);

        assert_eq!(entry.value, "test_value");
        assert_eq!(entry.stored_at, 1_000);
        assert!(!entry.is_expired(1_000));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new(1u8, 1_000, 500, 0);

        // Exactly at the TTL boundary the entry is still valid
        assert!(!entry.is_expired(1_500));
        assert!(entry.is_expired(1_501));
    }

    #[test]
    fn test_zero_ttl_valid_only_at_write_instant() {
        let entry = CacheEntry::new(1u8, 1_000, 0, 0);

        assert!(!entry.is_expired(1_000));
        assert!(entry.is_expired(1_001));
    }

    #[test]
    fn test_clock_going_backwards_is_not_expiry() {
        let entry = CacheEntry::new(1u8, 1_000, 10, 0);
        assert!(!entry.is_expired(900));
    }

    #[test]
    fn test_refresh_resets_stored_at() {
        let mut entry = CacheEntry::new(1u8, 1_000, 100, 0);

        entry.refresh(1_090, None, 1);
        assert_eq!(entry.stored_at, 1_090);
        assert_eq!(entry.ttl_ms, 100);
        assert!(!entry.is_expired(1_150));

        entry.refresh(1_100, Some(10), 2);
        assert_eq!(entry.ttl_ms, 10);
        assert!(entry.is_expired(1_111));
    }

    #[test]
    fn test_ttl_remaining_ms() {
        let entry = CacheEntry::new(1u8, 1_000, 10_000, 0);

        assert_eq!(entry.ttl_remaining_ms(1_000), 10_000);
        assert_eq!(entry.ttl_remaining_ms(4_000), 7_000);
        assert_eq!(entry.ttl_remaining_ms(20_000), 0);
    }
}
