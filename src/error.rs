//! Error types for the cache and fetch coordinator
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the crate.
///
/// Cloneable so that one terminal fetch failure can be recorded in resource
/// state and handed to every caller waiting on the same episode.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    /// Key not found (or expired) in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalidation pattern is not a valid regular expression
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Every fetch attempt for a resource failed
    #[error("Fetch for '{key}' failed after {attempts} attempt(s): {message}")]
    FetchFailed {
        key: String,
        attempts: u32,
        message: String,
    },

    /// No upstream source is configured
    #[error("Upstream unavailable: {0}")]
    Unavailable(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Builds an [`CacheError::InvalidPattern`] from a regex compile error.
    pub fn invalid_pattern(pattern: &str, err: regex::Error) -> Self {
        CacheError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: err.to_string(),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidPattern { .. } => StatusCode::BAD_REQUEST,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::FetchFailed { .. } => StatusCode::BAD_GATEWAY,
            CacheError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the crate.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_failed_message() {
        let err = CacheError::FetchFailed {
            key: "stats".to_string(),
            attempts: 3,
            message: "connection refused".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Fetch for 'stats' failed after 3 attempt(s): connection refused"
        );
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (CacheError::NotFound("k".into()), StatusCode::NOT_FOUND),
            (
                CacheError::InvalidRequest("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                CacheError::Unavailable("none".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                CacheError::FetchFailed {
                    key: "k".into(),
                    attempts: 1,
                    message: "boom".into(),
                },
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_invalid_pattern_from_regex_error() {
        let regex_err = regex::Regex::new("(").unwrap_err();
        let err = CacheError::invalid_pattern("(", regex_err);
        assert!(matches!(err, CacheError::InvalidPattern { ref pattern, .. } if pattern == "("));
    }
}
