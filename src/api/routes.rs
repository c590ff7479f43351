//! API Routes
//!
//! Configures the Axum router with all cache and resource endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cleanup_handler, clear_resources_handler, delete_handler, fetch_resource_handler,
    get_handler, health_handler, invalidate_handler, invalidate_resource_handler, keys_handler,
    resource_handler, resource_keys_handler, set_handler, stats_handler, touch_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /cache` - Store a JSON value
/// - `GET /cache` - List stored keys
/// - `GET /cache/:key` - Retrieve a value
/// - `DELETE /cache/:key` - Delete a key
/// - `POST /cache/:key/touch` - Extend a key's lifetime
/// - `POST /invalidate` - Delete keys matching a regex
/// - `POST /cleanup` - Sweep expired entries
/// - `GET /stats` - Cache statistics
/// - `GET /resources` - List resource keys
/// - `DELETE /resources` - Forget all resource state
/// - `GET /resources/:key` - Resource state snapshot
/// - `POST /resources/:key/fetch` - Fetch a resource from the upstream
/// - `POST /resources/:key/invalidate` - Mark a resource stale
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/cache", put(set_handler).get(keys_handler))
        .route("/cache/:key", get(get_handler).delete(delete_handler))
        .route("/cache/:key/touch", post(touch_handler))
        .route("/invalidate", post(invalidate_handler))
        .route("/cleanup", post(cleanup_handler))
        .route("/stats", get(stats_handler))
        .route(
            "/resources",
            get(resource_keys_handler).delete(clear_resources_handler),
        )
        .route("/resources/:key", get(resource_handler))
        .route("/resources/:key/fetch", post(fetch_resource_handler))
        .route(
            "/resources/:key/invalidate",
            post(invalidate_resource_handler),
        )
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::KeyedCache;
    use crate::clock::system_clock;
    use crate::resource::ResourceFetchCoordinator;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        let cache = KeyedCache::new(100, 300_000, system_clock());
        let state = AppState::new(cache, ResourceFetchCoordinator::default());
        create_router(state)
    }

    async fn status_of(method: &str, uri: &str) -> StatusCode {
        create_test_app()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        assert_eq!(status_of("GET", "/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        assert_eq!(status_of("GET", "/stats").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_set_endpoint() {
        let response = create_test_app()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/cache")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"key":"test","value":"hello"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_not_found() {
        assert_eq!(
            status_of("GET", "/cache/nonexistent").await,
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_cleanup_and_clear_endpoints() {
        assert_eq!(status_of("POST", "/cleanup").await, StatusCode::OK);
        assert_eq!(status_of("DELETE", "/resources").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_fetch_without_upstream() {
        assert_eq!(
            status_of("POST", "/resources/stats/fetch").await,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
