//! HTTP Transport
//!
//! reqwest-backed [`Transport`]. One pooled client per transport, a fixed
//! per-request timeout, no redirects beyond reqwest's defaults.

use std::time::Duration;

use async_trait::async_trait;
use tracing::trace;

use super::traits::{RawResponse, Transport};
use crate::config::ClientConfig;
use crate::error::{PulseError, Result};
use crate::models::ChatRequest;

/// Transport that talks to a live GaiaPulse deployment
#[derive(Clone, Debug)]
pub struct HttpTransport {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport for the given configuration
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .user_agent(concat!("gaiapulse-monitor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PulseError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(&ClientConfig::from_env())
    }

    /// The base URL requests are resolved against
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read(response: reqwest::Response) -> Result<RawResponse> {
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        trace!(status, bytes = body.len(), "Response received");
        Ok(RawResponse::new(status, body.to_vec()))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<RawResponse> {
        let url = self.url(path);
        trace!(%url, "GET");
        let response = self.http_client.get(&url).query(query).send().await?;
        Self::read(response).await
    }

    async fn post_json(&self, path: &str, body: &ChatRequest) -> Result<RawResponse> {
        let url = self.url(path);
        trace!(%url, "POST");
        let response = self.http_client.post(&url).json(body).send().await?;
        Self::read(response).await
    }
}
