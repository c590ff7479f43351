//! Response DTOs for the HTTP API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::resource::{ResourceState, ResourceStatus};

/// Response body for `GET /cache/:key`
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    pub key: String,
    pub value: Value,
    /// Remaining lifetime in milliseconds
    pub ttl_remaining_ms: Option<u64>,
}

/// Response body for `PUT /cache`
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    pub message: String,
    pub key: String,
}

impl SetResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
        }
    }
}

/// Response body for `DELETE /cache/:key` and `POST /cache/:key/touch`
#[derive(Debug, Clone, Serialize)]
pub struct KeyResponse {
    pub message: String,
    pub key: String,
}

impl KeyResponse {
    pub fn deleted(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }

    pub fn touched(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' touched successfully", key),
            key,
        }
    }
}

/// Response body for `GET /cache`
#[derive(Debug, Clone, Serialize)]
pub struct KeysResponse {
    pub keys: Vec<String>,
}

impl KeysResponse {
    /// Sorts keys so listings are stable.
    pub fn new(mut keys: Vec<String>) -> Self {
        keys.sort();
        Self { keys }
    }
}

/// Response body for the bulk removal endpoints
#[derive(Debug, Clone, Serialize)]
pub struct RemovedResponse {
    pub removed: usize,
}

/// Response body for `GET /resources/:key` and `POST /resources/:key/fetch`
#[derive(Debug, Clone, Serialize)]
pub struct ResourceResponse {
    pub key: String,
    pub status: ResourceStatus,
    pub data: Option<Value>,
    pub error: Option<String>,
    pub last_fetch_at: Option<u64>,
    pub expires_at: u64,
}

impl ResourceResponse {
    pub fn new(key: impl Into<String>, state: ResourceState<Value>) -> Self {
        Self {
            key: key.into(),
            status: state.status,
            data: state.data,
            error: state.error.map(|e| e.to_string()),
            last_fetch_at: state.last_fetch_at,
            expires_at: state.expires_at,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
