//! Resource Cache - TTL caching and coordinated resource fetching
//!
//! Provides a bounded key-value cache with per-entry TTL and a fetch
//! coordinator that de-duplicates, retries and caches async fetches per key.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod resource;
pub mod tasks;
pub mod upstream;

pub use api::AppState;
pub use cache::KeyedCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{CacheError, Result};
pub use resource::{FetchOptions, ResourceFetchCoordinator, ResourceState, ResourceStatus};
pub use tasks::spawn_cleanup_task;
pub use upstream::UpstreamClient;
