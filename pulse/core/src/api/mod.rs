//! GaiaPulse API Access
//!
//! Typed access to the remote service through a common trait interface.
//!
//! # Endpoints
//!
//! - `GET /api/v1/mood/current_mood` - current mood snapshot
//! - `GET /api/v1/mood/pulse_history?days=N` - reading history
//! - `POST /api/v1/chat` - chat assistant
//! - `GET /api/v1/health` - service health
//!
//! # Usage
//!
//! ```ignore
//! use pulse_core::api::{ApiClient, HttpTransport, PulseApi};
//!
//! let client = ApiClient::new(HttpTransport::from_env()?);
//! let mood = client.current_mood().await?;
//! ```

mod client;
mod http;
mod traits;

pub use client::{ApiClient, CHAT_PATH, CURRENT_MOOD_PATH, HEALTH_PATH, PULSE_HISTORY_PATH};
pub use http::HttpTransport;
pub use traits::{PulseApi, RawResponse, Transport};
