//! Pulse Core - Headless Client for the GaiaPulse Environmental API
//!
//! This crate polls the GaiaPulse service for Earth's current "mood" and its
//! reading history, validates every response against a strict schema before
//! it reaches a consumer, and runs the chat assistant conversation. It has no
//! rendering dependencies; a dashboard, a terminal view, or a daemon can sit
//! on top of it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Consumers                            │
//! │   dashboard view      chat panel       pulse-daemon (CLI)    │
//! └──────┬──────────────────┬──────────────────────┬─────────────┘
//!        │ PollSnapshot     │ ChatReply            │
//! ┌──────┴──────────────────┴──────────────────────┴─────────────┐
//! │                        PULSE CORE                            │
//! │  ┌──────────────┐   ┌─────────────┐   ┌────────────────────┐ │
//! │  │ PulseMonitor │   │ ChatSession │   │ animation (looks,  │ │
//! │  │  mood feed   │   │  retry +    │   │  particle field)   │ │
//! │  │  history feed│   │  fallback   │   └────────────────────┘ │
//! │  └──────┬───────┘   └──────┬──────┘                          │
//! │         └────────┬─────────┘                                 │
//! │           ┌──────┴──────┐     ┌────────────┐                 │
//! │           │  PulseApi   │ ──> │   schema   │                 │
//! │           │ (ApiClient) │     │ validation │                 │
//! │           └──────┬──────┘     └────────────┘                 │
//! │           ┌──────┴──────┐                                    │
//! │           │  Transport  │  HttpTransport (reqwest)           │
//! │           └─────────────┘                                    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use pulse_core::{load_config, ApiClient, HttpTransport, PulseMonitor};
//!
//! let config = load_config()?;
//! let api = Arc::new(ApiClient::new(HttpTransport::new(&config.client)?));
//!
//! let mut monitor = PulseMonitor::new(api, config.monitor);
//! monitor.mount();
//!
//! let mut moods = monitor.subscribe_mood();
//! while moods.changed().await.is_ok() {
//!     if let Some(mood) = moods.borrow().current.clone() {
//!         println!("{} ({:.0}%)", mood.mood, mood.score * 100.0);
//!     }
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`api`]: Transport and typed API traits, HTTP implementation
//! - [`schema`]: Response validation with field-path error reporting
//! - [`models`]: Mood, history, chat and health entities
//! - [`polling`]: Timed fetch controllers and retry policies
//! - [`monitor`]: Mood and history feeds with a shared lifecycle
//! - [`chat`]: Chat transcript with retry and fallback
//! - [`animation`]: Renderer-agnostic mood looks and particle layout
//! - [`config`]: Defaults, TOML file, environment and CLI layering
//! - [`error`]: Error taxonomy

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod animation;
pub mod api;
pub mod chat;
pub mod config;
pub mod error;
pub mod models;
pub mod monitor;
pub mod polling;
pub mod schema;

// Re-exports for convenience
pub use api::{ApiClient, HttpTransport, PulseApi, RawResponse, Transport};
pub use chat::{ChatMessage, ChatReply, ChatRole, ChatSession};
pub use error::{ErrorKind, PulseError, Result};
pub use models::{
    ChatExchange, ChatRequest, DataPoint, DataSource, HealthStatus, HistorySummary, MetadataValue,
    Mood, MoodSnapshot, PulseHistory,
};
pub use monitor::{MonitorConfig, PulseMonitor};
pub use polling::{
    Fetcher, HistoryFetcher, MoodFetcher, PollConfig, PollError, PollSnapshot, PollState,
    PollingController, RetryPolicy,
};
pub use schema::{SchemaError, SchemaErrorKind, Validate};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, ClientConfig, ConfigError,
    ConfigOverrides, ConfigSource, PulseConfig, PulseToml,
};
