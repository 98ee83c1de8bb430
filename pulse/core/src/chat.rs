//! Chat Session
//!
//! Transcript of a conversation with the GaiaPulse assistant. Sending goes
//! through the chat retry policy; when every attempt fails the transcript
//! gets a fixed, friendly fallback reply instead of the raw error.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::PulseApi;
use crate::error::{PulseError, Result};
use crate::models::{ChatExchange, MAX_VISIBLE_SUGGESTIONS};
use crate::polling::RetryPolicy;

/// Opening line of every session
pub const GREETING: &str = "Hello! I'm GaiaPulse AI, your environmental intelligence assistant. \
I can help you understand Earth's vital signs, climate trends, and environmental insights. \
What would you like to know about our planet's health?";

/// Suggestions offered with the greeting
pub const GREETING_SUGGESTIONS: [&str; 4] = [
    "Tell me about current climate trends",
    "What's Earth's current mood?",
    "How are our oceans doing?",
    "What can I do to help?",
];

/// Shown in place of a reply when the assistant cannot be reached
pub const FALLBACK_REPLY: &str =
    "I'm sorry, I'm having trouble connecting right now. Please try again in a moment.";

/// Who wrote a chat message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    /// The person using the dashboard
    User,
    /// The GaiaPulse assistant
    Assistant,
}

/// One entry in the transcript
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Position-independent identifier, unique within the session
    pub id: u64,
    /// Author
    pub role: ChatRole,
    /// Display text
    pub content: String,
    /// When the entry was added
    pub timestamp: DateTime<Utc>,
    /// Full assistant reply, when there was one
    pub exchange: Option<ChatExchange>,
}

impl ChatMessage {
    /// Suggestions to display under this entry
    #[must_use]
    pub fn visible_suggestions(&self) -> &[String] {
        self.exchange
            .as_ref()
            .map(ChatExchange::visible_suggestions)
            .unwrap_or_default()
    }
}

/// Outcome of [`ChatSession::send`]
#[derive(Clone, Debug, PartialEq)]
pub enum ChatReply {
    /// The assistant answered
    Answered(ChatExchange),
    /// Every attempt failed; the fallback reply was recorded
    Fallback {
        /// Failure of the last attempt
        error: PulseError,
    },
}

/// A conversation with the assistant
pub struct ChatSession {
    api: Arc<dyn PulseApi>,
    retry: RetryPolicy,
    messages: Vec<ChatMessage>,
    next_id: u64,
}

impl ChatSession {
    /// Start a session with the greeting entry
    pub fn new(api: Arc<dyn PulseApi>, retry: RetryPolicy) -> Self {
        let mut session = Self {
            api,
            retry,
            messages: Vec::new(),
            next_id: 1,
        };

        let now = Utc::now();
        let greeting = ChatExchange {
            response: GREETING.to_string(),
            confidence: 0.95,
            sources: vec!["GaiaPulse Environmental Database".to_string()],
            suggestions: GREETING_SUGGESTIONS.iter().map(|s| (*s).to_string()).collect(),
            timestamp: now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        };
        session.push(ChatRole::Assistant, GREETING.to_string(), Some(greeting));
        session
    }

    /// Start a session with the chat-send retry policy
    pub fn with_default_retry(api: Arc<dyn PulseApi>) -> Self {
        Self::new(api, RetryPolicy::chat_send())
    }

    /// Transcript, oldest first
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Most recent entry
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Suggestions from the most recent assistant reply, capped for display
    pub fn visible_suggestions(&self) -> &[String] {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::Assistant)
            .map(ChatMessage::visible_suggestions)
            .unwrap_or_default()
    }

    /// Send a message, retrying transient failures
    ///
    /// Blank input fails with [`PulseError::InvalidArgument`] and leaves the
    /// transcript untouched. Any other failure is absorbed into a
    /// [`ChatReply::Fallback`].
    pub async fn send(&mut self, text: &str) -> Result<ChatReply> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PulseError::InvalidArgument(
                "chat message must not be empty".to_string(),
            ));
        }

        self.push(ChatRole::User, text.to_string(), None);

        let mut retries_done = 0;
        let error = loop {
            match self.api.send_chat(text).await {
                Ok(exchange) => {
                    info!(
                        confidence = exchange.confidence,
                        retries_done, "Assistant replied"
                    );
                    self.push(
                        ChatRole::Assistant,
                        exchange.response.clone(),
                        Some(exchange.clone()),
                    );
                    return Ok(ChatReply::Answered(exchange));
                }
                Err(e) if e.is_retryable() && self.retry.allows_retry(retries_done) => {
                    let delay = self.retry.delay_for_attempt(retries_done);
                    retries_done += 1;
                    debug!(error = %e, delay_ms = delay.as_millis() as u64, "Chat send failed, backing off");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => break e,
            }
        };

        warn!(error = %error, retries_done, "Chat send failed, showing fallback");
        self.push(ChatRole::Assistant, FALLBACK_REPLY.to_string(), None);
        Ok(ChatReply::Fallback { error })
    }

    fn push(&mut self, role: ChatRole, content: String, exchange: Option<ChatExchange>) {
        self.messages.push(ChatMessage {
            id: self.next_id,
            role,
            content,
            timestamp: Utc::now(),
            exchange,
        });
        self.next_id += 1;
    }
}

// The greeting carries four suggestions; surfaces only ever see three
const _: () = assert!(GREETING_SUGGESTIONS.len() > MAX_VISIBLE_SUGGESTIONS);
