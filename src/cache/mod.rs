//! Cache Module
//!
//! Provides in-memory keyed caching with TTL expiration, pattern
//! invalidation and oldest-write eviction.

mod entry;
mod order;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use order::WriteOrder;
pub use stats::{hit_rate, CacheStats};
pub use store::{KeyedCache, Weigher};

// == Public Constants ==
/// Maximum allowed key length in bytes accepted by the HTTP surface
pub const MAX_KEY_LENGTH: usize = 256;

/// Default entry TTL: five minutes
pub const DEFAULT_TTL_MS: u64 = 5 * 60 * 1000;
