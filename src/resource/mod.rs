//! Resource Module
//!
//! Async fetch coordination for named resources: cached data with a
//! freshness window, one in-flight fetch per key, and linear-backoff retries.

mod coordinator;
mod retry;
mod state;

pub use coordinator::ResourceFetchCoordinator;
pub use retry::{
    retry_with_backoff, FetchOptions, RetryPolicy, DEFAULT_BACKOFF_BASE,
    DEFAULT_CACHE_DURATION_MS, DEFAULT_RETRIES,
};
pub use state::{ResourceAction, ResourceState, ResourceStatus};
