//! Request DTOs for the HTTP API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::Value;

use crate::cache::MAX_KEY_LENGTH;
use crate::resource::FetchOptions;

/// Request body for `PUT /cache`
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store, any JSON
    pub value: Value,
    /// Optional TTL in milliseconds
    #[serde(default)]
    pub ttl_ms: Option<u64>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_key(&self.key)
    }
}

/// Request body for `POST /cache/:key/touch`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TouchRequest {
    /// Replacement TTL in milliseconds
    #[serde(default)]
    pub ttl_ms: Option<u64>,
}

/// Request body for `POST /cache/invalidate`
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateRequest {
    /// Regular expression matched against keys
    pub pattern: String,
}

/// Request body for `POST /resources/:key/fetch`
///
/// Every field is optional; missing ones fall back to the server defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FetchRequest {
    #[serde(default)]
    pub force: Option<bool>,
    #[serde(default)]
    pub cache_duration_ms: Option<u64>,
    #[serde(default)]
    pub retries: Option<u32>,
}

impl FetchRequest {
    /// Overlays the request's fields on `defaults`.
    pub fn into_options(self, defaults: FetchOptions) -> FetchOptions {
        FetchOptions {
            force: self.force.unwrap_or(defaults.force),
            cache_duration_ms: self.cache_duration_ms.unwrap_or(defaults.cache_duration_ms),
            retries: self.retries.unwrap_or(defaults.retries),
        }
    }
}

/// Checks a key for emptiness and length.
pub fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_request_deserialize() {
        let json = r#"{"key": "test", "value": {"x": 1}}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.key, "test");
        assert_eq!(req.value, json!({"x": 1}));
        assert!(req.ttl_ms.is_none());
    }

    #[test]
    fn test_set_request_with_ttl() {
        let json = r#"{"key": "test", "value": "hello", "ttl_ms": 60000}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.ttl_ms, Some(60_000));
    }

    #[test]
    fn test_validate_empty_key() {
        let req = SetRequest {
            key: "".to_string(),
            value: json!("test"),
            ttl_ms: None,
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_long_key() {
        assert!(validate_key(&"x".repeat(MAX_KEY_LENGTH + 1)).is_some());
        assert!(validate_key(&"x".repeat(MAX_KEY_LENGTH)).is_none());
    }

    #[test]
    fn test_fetch_request_overlays_defaults() {
        let defaults = FetchOptions::default().with_retries(4);
        let req: FetchRequest = serde_json::from_str(r#"{"force": true}"#).unwrap();

        let options = req.into_options(defaults);
        assert!(options.force);
        assert_eq!(options.retries, 4);
        assert_eq!(options.cache_duration_ms, defaults.cache_duration_ms);
    }
}
