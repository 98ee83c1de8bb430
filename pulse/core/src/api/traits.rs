//! API Traits
//!
//! Two seams sit here. [`PulseApi`] is what controllers and the chat session
//! talk to: one typed operation per endpoint. [`Transport`] is what the API
//! client talks to: raw HTTP request/response pairs. Keeping them apart lets
//! tests count exactly which requests reach the network.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ChatExchange, ChatRequest, HealthStatus, MoodSnapshot, PulseHistory};

/// Status and body of an HTTP response
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body bytes
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Create a response
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is 2xx
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Raw HTTP access to the GaiaPulse service
///
/// Implementations resolve `path` against their base URL. A response with
/// any status is `Ok`; `Err` means the request never completed.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET with the given query parameters
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<RawResponse>;

    /// Issue a POST with a JSON body
    async fn post_json(&self, path: &str, body: &ChatRequest) -> Result<RawResponse>;
}

/// Typed operations against the GaiaPulse API
///
/// Each call is one request/response cycle. Implementations never retry
/// and never cache.
#[async_trait]
pub trait PulseApi: Send + Sync {
    /// Name for logging
    fn name(&self) -> &str;

    /// Fetch the current mood
    async fn current_mood(&self) -> Result<MoodSnapshot>;

    /// Fetch `days` days of pulse history; `days` must be positive
    async fn pulse_history(&self, days: i64) -> Result<PulseHistory>;

    /// Send a chat message; `text` must not be blank
    async fn send_chat(&self, text: &str) -> Result<ChatExchange>;

    /// Fetch the service health report
    async fn health_check(&self) -> Result<HealthStatus>;
}
