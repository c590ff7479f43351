//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::DEFAULT_TTL_MS;
use crate::resource::{FetchOptions, DEFAULT_CACHE_DURATION_MS, DEFAULT_RETRIES};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Default TTL in milliseconds for entries written without one
    pub default_ttl_ms: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Periodic sweep interval in seconds, 0 disables the sweep task
    pub cleanup_interval: u64,
    /// Attempts per resource fetch episode
    pub fetch_retries: u32,
    /// Backoff unit between fetch attempts, in milliseconds
    pub retry_base_delay_ms: u64,
    /// Freshness window for fetched resources, in milliseconds
    pub cache_duration_ms: u64,
    /// Base URL resource fetches are proxied to
    pub upstream_url: Option<String>,
    /// Per-request timeout towards the upstream, in seconds
    pub upstream_timeout_secs: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `DEFAULT_TTL_MS` - Default entry TTL in ms (default: 300000)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds, 0 = off (default: 0)
    /// - `FETCH_RETRIES` - Attempts per fetch (default: 3)
    /// - `RETRY_BASE_DELAY_MS` - Backoff unit in ms (default: 1000)
    /// - `CACHE_DURATION_MS` - Resource freshness in ms (default: 300000)
    /// - `UPSTREAM_URL` - Upstream base URL (default: unset)
    /// - `UPSTREAM_TIMEOUT_SECS` - Upstream request timeout (default: 30)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
            default_ttl_ms: env_or("DEFAULT_TTL_MS", defaults.default_ttl_ms),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            fetch_retries: env_or("FETCH_RETRIES", defaults.fetch_retries),
            retry_base_delay_ms: env_or("RETRY_BASE_DELAY_MS", defaults.retry_base_delay_ms),
            cache_duration_ms: env_or("CACHE_DURATION_MS", defaults.cache_duration_ms),
            upstream_url: env::var("UPSTREAM_URL").ok().filter(|url| !url.is_empty()),
            upstream_timeout_secs: env_or("UPSTREAM_TIMEOUT_SECS", defaults.upstream_timeout_secs),
        }
    }

    /// Fetch options applied when a request does not override them.
    pub fn fetch_defaults(&self) -> FetchOptions {
        FetchOptions::default()
            .with_retries(self.fetch_retries)
            .with_cache_duration_ms(self.cache_duration_ms)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            default_ttl_ms: DEFAULT_TTL_MS,
            server_port: 3000,
            cleanup_interval: 0,
            fetch_retries: DEFAULT_RETRIES,
            retry_base_delay_ms: 1000,
            cache_duration_ms: DEFAULT_CACHE_DURATION_MS,
            upstream_url: None,
            upstream_timeout_secs: 30,
        }
    }
}

/// Parses `name` from the environment, falling back when unset or malformed.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.max_entries, 1000);
        assert_eq!(config.default_ttl_ms, 300_000);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cleanup_interval, 0);
        assert_eq!(config.fetch_retries, 3);
        assert_eq!(config.retry_base_delay(), Duration::from_secs(1));
        assert!(config.upstream_url.is_none());
    }

    #[test]
    fn test_fetch_defaults_follow_config() {
        let config = Config {
            fetch_retries: 5,
            cache_duration_ms: 1_000,
            ..Config::default()
        };

        let options = config.fetch_defaults();
        assert_eq!(options.retries, 5);
        assert_eq!(options.cache_duration_ms, 1_000);
        assert!(!options.force);
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        env::set_var("RESOURCE_CACHE_TEST_GARBAGE", "not-a-number");
        assert_eq!(env_or("RESOURCE_CACHE_TEST_GARBAGE", 7u32), 7);
        env::remove_var("RESOURCE_CACHE_TEST_GARBAGE");
    }

    #[test]
    fn test_env_or_reads_value() {
        env::set_var("RESOURCE_CACHE_TEST_VALUE", "42");
        assert_eq!(env_or("RESOURCE_CACHE_TEST_VALUE", 7u32), 42);
        env::remove_var("RESOURCE_CACHE_TEST_VALUE");
    }
}
