//! API Client
//!
//! Validates arguments, issues one request through a [`Transport`], checks
//! the status, and hands the body to the schema validator.

use async_trait::async_trait;
use tracing::{debug, warn};

use super::traits::{PulseApi, RawResponse, Transport};
use crate::error::{PulseError, Result};
use crate::models::{ChatExchange, ChatRequest, HealthStatus, MoodSnapshot, PulseHistory};
use crate::schema::{self, Validate};

/// Current mood endpoint
pub const CURRENT_MOOD_PATH: &str = "/api/v1/mood/current_mood";
/// Pulse history endpoint
pub const PULSE_HISTORY_PATH: &str = "/api/v1/mood/pulse_history";
/// Chat endpoint
pub const CHAT_PATH: &str = "/api/v1/chat";
/// Health endpoint
pub const HEALTH_PATH: &str = "/api/v1/health";

/// GaiaPulse API client over any transport
#[derive(Clone, Debug)]
pub struct ApiClient<T: Transport> {
    transport: T,
}

impl<T: Transport> ApiClient<T> {
    /// Create a client over the given transport
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Borrow the underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn check_status(path: &str, response: &RawResponse) -> Result<()> {
        if response.is_success() {
            Ok(())
        } else {
            warn!(path, status = response.status, "Non-success response");
            Err(PulseError::Transport {
                status: response.status,
            })
        }
    }

    fn decode_envelope<E: Validate>(path: &str, response: &RawResponse) -> Result<E> {
        Self::check_status(path, response)?;
        schema::decode_envelope(&response.body).map_err(|e| {
            warn!(path, error = %e, "Response failed validation");
            PulseError::from(e)
        })
    }
}

#[async_trait]
impl<T: Transport> PulseApi for ApiClient<T> {
    fn name(&self) -> &str {
        "GaiaPulse"
    }

    async fn current_mood(&self) -> Result<MoodSnapshot> {
        let response = self.transport.get(CURRENT_MOOD_PATH, &[]).await?;
        let mood: MoodSnapshot = Self::decode_envelope(CURRENT_MOOD_PATH, &response)?;
        debug!(mood = %mood.mood, score = mood.score, "Fetched current mood");
        Ok(mood)
    }

    async fn pulse_history(&self, days: i64) -> Result<PulseHistory> {
        if days <= 0 {
            return Err(PulseError::InvalidArgument(format!(
                "days must be a positive integer, got {days}"
            )));
        }

        let response = self
            .transport
            .get(PULSE_HISTORY_PATH, &[("days", days.to_string())])
            .await?;
        let history: PulseHistory = Self::decode_envelope(PULSE_HISTORY_PATH, &response)?;
        debug!(days, points = history.total_points, "Fetched pulse history");
        Ok(history)
    }

    async fn send_chat(&self, text: &str) -> Result<ChatExchange> {
        if text.trim().is_empty() {
            return Err(PulseError::InvalidArgument(
                "chat message must not be empty".to_string(),
            ));
        }

        let request = ChatRequest::new(text);
        let response = self.transport.post_json(CHAT_PATH, &request).await?;
        let exchange: ChatExchange = Self::decode_envelope(CHAT_PATH, &response)?;
        debug!(
            confidence = exchange.confidence,
            suggestions = exchange.suggestions.len(),
            "Received chat reply"
        );
        Ok(exchange)
    }

    async fn health_check(&self) -> Result<HealthStatus> {
        let response = self.transport.get(HEALTH_PATH, &[]).await?;
        Self::check_status(HEALTH_PATH, &response)?;
        Ok(schema::decode(&response.body)?)
    }
}
