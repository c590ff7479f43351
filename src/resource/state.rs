//! Resource State Module
//!
//! Per-key fetch state and the pure transition function that drives it.

use serde::Serialize;

use crate::error::CacheError;

// == Resource Status ==
/// Lifecycle phase of a resource key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
    /// Never fetched, or reset by a full clear
    #[default]
    Idle,
    /// A fetch episode is in flight
    Loading,
    /// The last episode produced data
    Success,
    /// The last episode exhausted its retries
    Failed,
}

// == Resource Action ==
/// Transition requests understood by [`ResourceState::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceAction<T> {
    /// A fetch episode begins
    Start,
    /// The episode produced `data` at `now`
    Succeed {
        data: T,
        now: u64,
        cache_duration_ms: u64,
    },
    /// The episode gave up
    Fail { error: CacheError },
    /// Mark cached data stale without dropping it
    Invalidate,
}

// == Resource State ==
/// Snapshot of what is known about one resource key.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState<T> {
    pub status: ResourceStatus,
    /// Last successfully fetched value
    pub data: Option<T>,
    /// Most recent terminal failure, cleared when a new episode starts
    pub error: Option<CacheError>,
    /// When `data` was fetched (Unix milliseconds)
    pub last_fetch_at: Option<u64>,
    /// After this instant `data` is stale; `0` means stale right away
    pub expires_at: u64,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            status: ResourceStatus::Idle,
            data: None,
            error: None,
            last_fetch_at: None,
            expires_at: 0,
        }
    }
}

impl<T> ResourceState<T> {
    /// Returns the state that follows `self` under `action`.
    ///
    /// `Start` and `Fail` keep the previous data so callers can keep
    /// rendering it while a refetch runs or after it fails.
    pub fn apply(self, action: ResourceAction<T>) -> Self {
        match action {
            ResourceAction::Start => Self {
                status: ResourceStatus::Loading,
                error: None,
                ..self
            },
            ResourceAction::Succeed {
                data,
                now,
                cache_duration_ms,
            } => Self {
                status: ResourceStatus::Success,
                data: Some(data),
                error: None,
                last_fetch_at: Some(now),
                expires_at: now.saturating_add(cache_duration_ms),
            },
            ResourceAction::Fail { error } => Self {
                status: ResourceStatus::Failed,
                error: Some(error),
                ..self
            },
            ResourceAction::Invalidate => Self {
                expires_at: 0,
                ..self
            },
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == ResourceStatus::Loading
    }

    /// Returns the data if it is still fresh at `now`.
    pub fn fresh_data(&self, now: u64) -> Option<&T> {
        self.data.as_ref().filter(|_| now <= self.expires_at)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn failure() -> CacheError {
        CacheError::FetchFailed {
            key: "k".to_string(),
            attempts: 3,
            message: "timeout".to_string(),
        }
    }

    fn succeeded(data: u32, now: u64, cache_duration_ms: u64) -> ResourceState<u32> {
        ResourceState::default()
            .apply(ResourceAction::Start)
            .apply(ResourceAction::Succeed {
                data,
                now,
                cache_duration_ms,
            })
    }

    #[test]
    fn test_default_is_idle() {
        let state: ResourceState<u32> = ResourceState::default();
        assert_eq!(state.status, ResourceStatus::Idle);
        assert!(state.data.is_none());
        assert!(state.fresh_data(0).is_none());
    }

    #[test]
    fn test_start_clears_error_and_keeps_data() {
        let state = succeeded(1, 100, 50)
            .apply(ResourceAction::Start)
            .apply(ResourceAction::Fail { error: failure() })
            .apply(ResourceAction::Start);

        assert!(state.is_loading());
        assert!(state.error.is_none());
        assert_eq!(state.data, Some(1));
    }

    #[test]
    fn test_succeed_sets_expiry() {
        let state = succeeded(7, 1_000, 500);

        assert_eq!(state.status, ResourceStatus::Success);
        assert_eq!(state.last_fetch_at, Some(1_000));
        assert_eq!(state.expires_at, 1_500);
        assert_eq!(state.fresh_data(1_500), Some(&7));
        assert_eq!(state.fresh_data(1_501), None);
    }

    #[test]
    fn test_fail_keeps_previous_data() {
        let state = succeeded(7, 1_000, 500)
            .apply(ResourceAction::Start)
            .apply(ResourceAction::Fail { error: failure() });

        assert_eq!(state.status, ResourceStatus::Failed);
        assert_eq!(state.data, Some(7));
        assert_eq!(state.error, Some(failure()));
        assert_eq!(state.last_fetch_at, Some(1_000));
    }

    #[test]
    fn test_invalidate_makes_data_stale() {
        let state = succeeded(7, 1_000, 500).apply(ResourceAction::Invalidate);

        assert_eq!(state.expires_at, 0);
        assert_eq!(state.data, Some(7));
        assert_eq!(state.status, ResourceStatus::Success);
        assert!(state.fresh_data(1_001).is_none());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&ResourceStatus::Loading).unwrap();
        assert_eq!(json, "\"loading\"");
    }
}
