//! Upstream Module
//!
//! HTTP client for the backend the server proxies resource fetches to.

use std::time::Duration;

use anyhow::Context;
use serde_json::Value;
use tracing::debug;

const USER_AGENT: &str = concat!("resource_cache/", env!("CARGO_PKG_VERSION"));

// == Upstream Client ==
/// Fetches JSON documents from `{base_url}/{path}`.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    base_url: String,
}

impl UpstreamClient {
    /// Creates a client with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GETs `path` and decodes the body as JSON.
    ///
    /// Transport failures, non-2xx statuses and undecodable bodies are all
    /// errors.
    pub async fn fetch_json(&self, path: &str) -> anyhow::Result<Value> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!(%url, "fetching from upstream");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?
            .error_for_status()
            .with_context(|| format!("upstream rejected {url}"))?;

        response
            .json::<Value>()
            .await
            .with_context(|| format!("invalid JSON from {url}"))
    }
}
