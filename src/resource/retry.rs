//! Retry Module
//!
//! Fetch options and the linear-backoff retry loop used by the coordinator.

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::{CacheError, Result};

// == Defaults ==
/// How long fetched data stays fresh: five minutes
pub const DEFAULT_CACHE_DURATION_MS: u64 = 5 * 60 * 1000;

/// Attempts per fetch episode
pub const DEFAULT_RETRIES: u32 = 3;

/// Backoff unit; the wait after attempt `n` is `n` units
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(1000);

// == Fetch Options ==
/// Per-call knobs for [`fetch_data`](super::ResourceFetchCoordinator::fetch_data).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Skip the fresh-data check and fetch anyway
    pub force: bool,
    /// Freshness window for the fetched data
    pub cache_duration_ms: u64,
    /// Total attempts, including the first; `0` behaves like `1`
    pub retries: u32,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            force: false,
            cache_duration_ms: DEFAULT_CACHE_DURATION_MS,
            retries: DEFAULT_RETRIES,
        }
    }
}

impl FetchOptions {
    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }

    pub fn with_cache_duration_ms(mut self, cache_duration_ms: u64) -> Self {
        self.cache_duration_ms = cache_duration_ms;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Number of attempts this call will make at most.
    pub fn attempts(&self) -> u32 {
        self.retries.max(1)
    }
}

// == Retry Policy ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            base_delay,
        }
    }

    /// Wait before the attempt following attempt number `attempt` (1-based),
    /// or `None` once the attempts are used up.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        (attempt < self.attempts).then(|| self.base_delay * attempt)
    }
}

// == Retry Loop ==
/// Runs `op` until it succeeds or the policy's attempts are used up.
///
/// Each failed attempt is logged; only the last error is returned, wrapped
/// as [`CacheError::FetchFailed`].
pub async fn retry_with_backoff<T, F, Fut>(key: &str, policy: RetryPolicy, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;

        let err = match op().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(key, attempt, "fetch succeeded after retrying");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        match policy.delay_after(attempt) {
            Some(delay) => {
                warn!(
                    key,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "fetch attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            None => {
                warn!(key, attempts = attempt, error = %err, "fetch failed, giving up");
                return Err(CacheError::FetchFailed {
                    key: key.to_string(),
                    attempts: attempt,
                    message: format!("{err:#}"),
                });
            }
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_fetch_options_default() {
        let options = FetchOptions::default();
        assert!(!options.force);
        assert_eq!(options.cache_duration_ms, 300_000);
        assert_eq!(options.retries, 3);
    }

    #[test]
    fn test_fetch_options_builders() {
        let options = FetchOptions::default()
            .forced()
            .with_cache_duration_ms(500)
            .with_retries(0);

        assert!(options.force);
        assert_eq!(options.cache_duration_ms, 500);
        assert_eq!(options.attempts(), 1);
    }

    #[test]
    fn test_linear_backoff_schedule() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1000));

        assert_eq!(policy.delay_after(1), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay_after(2), Some(Duration::from_secs(2)));
        assert_eq!(policy.delay_after(3), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_gives_up_after_last_attempt() {
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result: Result<u32> = retry_with_backoff(
            "k",
            RetryPolicy::new(3, DEFAULT_BACKOFF_BASE),
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(anyhow!("connection reset")) }
            },
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1s after the first failure, 2s after the second, none after the last
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(3) && elapsed < Duration::from_secs(4));
        match result {
            Err(CacheError::FetchFailed {
                attempts, message, ..
            }) => {
                assert_eq!(attempts, 3);
                assert_eq!(message, "connection reset");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_stops_at_first_success() {
        let calls = AtomicU32::new(0);

        let result = retry_with_backoff("k", RetryPolicy::new(5, DEFAULT_BACKOFF_BASE), || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 2 {
                    Err(anyhow!("flaky"))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
