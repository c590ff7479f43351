//! API Handlers
//!
//! HTTP request handlers for the cache and resource endpoints.

use std::sync::Arc;
use tokio::sync::RwLock;

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cache::{CacheStats, KeyedCache};
use crate::clock::system_clock;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    validate_key, FetchRequest, GetResponse, HealthResponse, InvalidateRequest, KeyResponse,
    KeysResponse, RemovedResponse, ResourceResponse, SetRequest, SetResponse, TouchRequest,
};
use crate::resource::{FetchOptions, ResourceFetchCoordinator};
use crate::upstream::UpstreamClient;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// JSON value cache
    pub cache: Arc<RwLock<KeyedCache<Value>>>,
    /// Upstream-backed resources
    pub resources: Arc<ResourceFetchCoordinator<Value>>,
    /// Where resource fetches go; resource fetches fail with 503 without it
    pub upstream: Option<UpstreamClient>,
    /// Fetch options used when a request does not override them
    pub fetch_defaults: FetchOptions,
}

impl AppState {
    /// Creates a new AppState with no upstream and default fetch options.
    pub fn new(cache: KeyedCache<Value>, resources: ResourceFetchCoordinator<Value>) -> Self {
        Self {
            cache: Arc::new(RwLock::new(cache)),
            resources: Arc::new(resources),
            upstream: None,
            fetch_defaults: FetchOptions::default(),
        }
    }

    pub fn with_upstream(mut self, upstream: UpstreamClient) -> Self {
        self.upstream = Some(upstream);
        self
    }

    pub fn with_fetch_defaults(mut self, fetch_defaults: FetchOptions) -> Self {
        self.fetch_defaults = fetch_defaults;
        self
    }

    /// Creates a new AppState from configuration, using the system clock.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let clock = system_clock();
        let cache = KeyedCache::new(config.max_entries, config.default_ttl_ms, clock.clone())
            .with_weigher(json_weight);
        let resources =
            ResourceFetchCoordinator::new(clock).with_backoff_base(config.retry_base_delay());

        let mut state = Self::new(cache, resources).with_fetch_defaults(config.fetch_defaults());
        if let Some(url) = &config.upstream_url {
            let timeout = std::time::Duration::from_secs(config.upstream_timeout_secs);
            state = state.with_upstream(UpstreamClient::new(url, timeout)?);
        }
        Ok(state)
    }
}

/// Size of a JSON value as its compact serialization.
pub fn json_weight(_key: &str, value: &Value) -> usize {
    value.to_string().len()
}

/// Parses an optional JSON body. An empty body yields `T::default()`; a body
/// that is not valid JSON for `T` is rejected.
fn optional_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| CacheError::InvalidRequest(format!("Malformed request body: {}", e)))
}

// == Cache Handlers ==

/// Handler for PUT /cache
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    state
        .cache
        .write()
        .await
        .set(req.key.clone(), req.value, req.ttl_ms);

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /cache/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    // Write lock: expired entries are removed on read
    let mut cache = state.cache.write().await;
    let value = cache
        .get(&key)
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;
    let ttl_remaining_ms = cache.ttl_remaining_ms(&key);

    Ok(Json(GetResponse {
        key,
        value,
        ttl_remaining_ms,
    }))
}

/// Handler for DELETE /cache/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<KeyResponse>> {
    if state.cache.write().await.delete(&key) {
        Ok(Json(KeyResponse::deleted(key)))
    } else {
        Err(CacheError::NotFound(key))
    }
}

/// Handler for POST /cache/:key/touch
///
/// The body is optional; without one the entry keeps its TTL.
pub async fn touch_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: Bytes,
) -> Result<Json<KeyResponse>> {
    let ttl_ms = optional_body::<TouchRequest>(&body)?.ttl_ms;

    if state.cache.write().await.touch(&key, ttl_ms) {
        Ok(Json(KeyResponse::touched(key)))
    } else {
        Err(CacheError::NotFound(key))
    }
}

/// Handler for GET /cache
pub async fn keys_handler(State(state): State<AppState>) -> Json<KeysResponse> {
    Json(KeysResponse::new(state.cache.read().await.keys()))
}

/// Handler for POST /invalidate
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidateRequest>,
) -> Result<Json<RemovedResponse>> {
    let removed = state.cache.write().await.invalidate_pattern(&req.pattern)?;
    Ok(Json(RemovedResponse { removed }))
}

/// Handler for POST /cleanup
pub async fn cleanup_handler(State(state): State<AppState>) -> Json<RemovedResponse> {
    let removed = state.cache.write().await.cleanup();
    Json(RemovedResponse { removed })
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.read().await.stats())
}

// == Resource Handlers ==

/// Handler for GET /resources
pub async fn resource_keys_handler(State(state): State<AppState>) -> Json<KeysResponse> {
    Json(KeysResponse::new(state.resources.keys()))
}

/// Handler for GET /resources/:key
///
/// Unknown keys report the idle state rather than 404.
pub async fn resource_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<ResourceResponse> {
    let snapshot = state.resources.state(&key).unwrap_or_default();
    Json(ResourceResponse::new(key, snapshot))
}

/// Handler for POST /resources/:key/fetch
///
/// Fetches `{upstream}/{key}` through the coordinator. The body is optional
/// and overrides the server's fetch defaults field by field.
pub async fn fetch_resource_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: Bytes,
) -> Result<Json<ResourceResponse>> {
    if let Some(error_msg) = validate_key(&key) {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let options = optional_body::<FetchRequest>(&body)?.into_options(state.fetch_defaults);
    let upstream = state
        .upstream
        .clone()
        .ok_or_else(|| CacheError::Unavailable("no upstream configured".to_string()))?;

    let path = key.clone();
    let data = state
        .resources
        .fetch_data(
            &key,
            move || {
                let upstream = upstream.clone();
                let path = path.clone();
                async move { upstream.fetch_json(&path).await }
            },
            options,
        )
        .await?;

    let mut response = ResourceResponse::new(&key, state.resources.state(&key).unwrap_or_default());
    response.data = Some(data);
    Ok(Json(response))
}

/// Handler for POST /resources/:key/invalidate
pub async fn invalidate_resource_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<ResourceResponse> {
    state.resources.invalidate_data(&key);
    let snapshot = state.resources.state(&key).unwrap_or_default();
    Json(ResourceResponse::new(key, snapshot))
}

/// Handler for DELETE /resources
pub async fn clear_resources_handler(State(state): State<AppState>) -> Json<RemovedResponse> {
    let removed = state.resources.keys().len();
    state.resources.clear_all_data();
    Json(RemovedResponse { removed })
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
