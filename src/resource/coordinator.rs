//! Resource Fetch Coordinator
//!
//! Tracks loading, error and data state per resource key, serves fresh data
//! without fetching, and runs at most one fetch episode per key at a time.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::retry::{retry_with_backoff, FetchOptions, RetryPolicy, DEFAULT_BACKOFF_BASE};
use super::state::{ResourceAction, ResourceState};
use crate::clock::{system_clock, Clock};
use crate::error::{CacheError, Result};

type SharedFetch<T> = Shared<BoxFuture<'static, Result<T>>>;

struct InFlight<T> {
    episode: u64,
    fetch: SharedFetch<T>,
}

struct Slot<T> {
    state: ResourceState<T>,
    in_flight: Option<InFlight<T>>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            state: ResourceState::default(),
            in_flight: None,
        }
    }
}

impl<T> Slot<T> {
    fn transition(&mut self, action: ResourceAction<T>) {
        self.state = std::mem::take(&mut self.state).apply(action);
    }
}

type Slots<T> = Arc<Mutex<HashMap<String, Slot<T>>>>;

// == Resource Fetch Coordinator ==
/// Per-key fetch orchestration with caching, de-duplication and retries.
///
/// A caller asking for a key that is already loading awaits the in-flight
/// episode and receives its outcome, so one episode triggers one sequence of
/// fetch attempts no matter how many callers join it. Episodes are not
/// cancelled when a caller drops its future; a fetch that never completes
/// keeps its key loading.
///
/// Construct one instance per scope and share it by reference or `Arc`.
pub struct ResourceFetchCoordinator<T> {
    slots: Slots<T>,
    clock: Arc<dyn Clock>,
    backoff_base: Duration,
    next_episode: AtomicU64,
}

impl<T> fmt::Debug for ResourceFetchCoordinator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceFetchCoordinator")
            .field("resources", &self.slots.lock().len())
            .field("clock", &self.clock)
            .field("backoff_base", &self.backoff_base)
            .finish()
    }
}

impl<T> Default for ResourceFetchCoordinator<T> {
    fn default() -> Self {
        Self::new(system_clock())
    }
}

impl<T> ResourceFetchCoordinator<T> {
    // == Constructor ==
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            slots: Arc::default(),
            clock,
            backoff_base: DEFAULT_BACKOFF_BASE,
            next_episode: AtomicU64::new(0),
        }
    }

    /// Sets the backoff unit: the wait after failed attempt `n` is `n * base`.
    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    // == Invalidate ==
    /// Marks the key's data stale while keeping it readable.
    ///
    /// The next non-forced [`fetch_data`](Self::fetch_data) refetches.
    /// Unknown keys are ignored.
    pub fn invalidate_data(&self, key: &str) {
        if let Some(slot) = self.slots.lock().get_mut(key) {
            slot.transition(ResourceAction::Invalidate);
            debug!(key, "resource invalidated");
        }
    }

    // == Clear ==
    /// Forgets every key. Episodes still in flight return to their callers
    /// but do not write their results back.
    pub fn clear_all_data(&self) {
        let mut slots = self.slots.lock();
        debug!(resources = slots.len(), "clearing all resource state");
        slots.clear();
    }

    // == Accessors ==
    pub fn is_loading(&self, key: &str) -> bool {
        self.slots
            .lock()
            .get(key)
            .is_some_and(|slot| slot.state.is_loading())
    }

    /// Returns the key's last recorded failure, if any.
    pub fn get_error(&self, key: &str) -> Option<CacheError> {
        self.slots
            .lock()
            .get(key)
            .and_then(|slot| slot.state.error.clone())
    }

    /// Returns every key that has state.
    pub fn keys(&self) -> Vec<String> {
        self.slots.lock().keys().cloned().collect()
    }
}

impl<T> ResourceFetchCoordinator<T>
where
    T: Clone + Send + Sync + 'static,
{
    // == Fetch Data ==
    /// Returns data for `key`, fetching it with `fetch_fn` when needed.
    ///
    /// 1. Without `force`, fresh data is returned as-is.
    /// 2. If the key is loading, the call joins the running episode.
    /// 3. Otherwise a new episode starts: up to `options.retries` attempts
    ///    with linear backoff, then the outcome is recorded and returned.
    ///
    /// A failed episode is returned as [`CacheError::FetchFailed`] to every
    /// caller that awaited it, and kept as the key's error. A fetch that
    /// panics fails its episode with [`CacheError::Internal`].
    ///
    /// Episodes run on spawned tasks, so this must be called from within a
    /// Tokio runtime. Dropping the returned future does not stop the episode.
    pub async fn fetch_data<F, Fut>(&self, key: &str, fetch_fn: F, options: FetchOptions) -> Result<T>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let fetch = {
            let mut slots = self.slots.lock();
            let slot = slots.entry(key.to_string()).or_default();

            if !options.force {
                if let Some(data) = slot.state.fresh_data(self.clock.now_ms()) {
                    debug!(key, "resource served from cache");
                    return Ok(data.clone());
                }
            }

            let joined = slot
                .in_flight
                .as_ref()
                .map(|in_flight| (in_flight.episode, in_flight.fetch.clone()));

            match joined {
                Some((episode, fetch)) => {
                    debug!(key, episode, "joining in-flight fetch");
                    fetch
                }
                None => {
                    let episode = self.next_episode.fetch_add(1, Ordering::Relaxed);
                    let fetch = self.start_episode(key, episode, fetch_fn, options);
                    slot.transition(ResourceAction::Start);
                    slot.in_flight = Some(InFlight {
                        episode,
                        fetch: fetch.clone(),
                    });
                    debug!(key, episode, force = options.force, "fetch episode started");
                    fetch
                }
            }
        };

        fetch.await
    }

    /// Returns the key's data whether fresh or stale.
    pub fn get_data(&self, key: &str) -> Option<T> {
        self.slots
            .lock()
            .get(key)
            .and_then(|slot| slot.state.data.clone())
    }

    /// Returns a copy of the key's full state.
    pub fn state(&self, key: &str) -> Option<ResourceState<T>> {
        self.slots.lock().get(key).map(|slot| slot.state.clone())
    }

    fn start_episode<F, Fut>(
        &self,
        key: &str,
        episode: u64,
        fetch_fn: F,
        options: FetchOptions,
    ) -> SharedFetch<T>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let slots = Arc::clone(&self.slots);
        let clock = Arc::clone(&self.clock);
        let key = key.to_string();
        let policy = RetryPolicy::new(options.attempts(), self.backoff_base);

        // Detached: the outcome is recorded whether or not a caller polls.
        // A panicking fetch surfaces as a JoinError of the inner task.
        let attempts = {
            let key = key.clone();
            tokio::spawn(async move { retry_with_backoff(&key, policy, fetch_fn).await })
        };
        let episode_task = tokio::spawn(async move {
            let outcome = match attempts.await {
                Ok(outcome) => outcome,
                Err(join_error) => {
                    warn!(key = %key, episode, error = %join_error, "fetch task aborted");
                    Err(CacheError::Internal(format!("fetch for '{key}' aborted: {join_error}")))
                }
            };
            record_outcome(&slots, &key, episode, &outcome, clock.now_ms(), options.cache_duration_ms);
            outcome
        });

        async move {
            episode_task
                .await
                .unwrap_or_else(|join_error| Err(CacheError::Internal(join_error.to_string())))
        }
        .boxed()
        .shared()
    }
}

/// Writes an episode's outcome into its slot, unless the slot was cleared or
/// taken over by a newer episode in the meantime.
fn record_outcome<T: Clone>(
    slots: &Mutex<HashMap<String, Slot<T>>>,
    key: &str,
    episode: u64,
    outcome: &Result<T>,
    now: u64,
    cache_duration_ms: u64,
) {
    let mut slots = slots.lock();
    let slot = match slots.get_mut(key) {
        Some(slot) if slot.in_flight.as_ref().map(|f| f.episode) == Some(episode) => slot,
        _ => {
            debug!(key, episode, "discarding outcome of a cleared episode");
            return;
        }
    };

    slot.in_flight = None;
    let action = match outcome {
        Ok(data) => ResourceAction::Succeed {
            data: data.clone(),
            now,
            cache_duration_ms,
        },
        Err(error) => ResourceAction::Fail {
            error: error.clone(),
        },
    };
    slot.transition(action);
}
