//! Polling State
//!
//! What a controller publishes to its consumers after every transition.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::error::{ErrorKind, PulseError};

/// Controller lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollState {
    /// Not started, or stopped before the first fetch
    Idle,
    /// A request is in flight
    Fetching,
    /// Last fetch succeeded
    Ready,
    /// Last fetch failed; any previous value is still held
    Degraded,
}

impl std::fmt::Display for PollState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Ready => "ready",
            Self::Degraded => "degraded",
        };
        f.write_str(s)
    }
}

/// The failure behind a degraded state
#[derive(Clone, Debug, PartialEq)]
pub struct PollError {
    /// Classification of the failure
    pub kind: ErrorKind,
    /// Human-readable description
    pub message: String,
}

impl From<&PulseError> for PollError {
    fn from(e: &PulseError) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

/// Point-in-time view of a controller
#[derive(Debug)]
pub struct PollSnapshot<T> {
    /// Lifecycle state
    pub state: PollState,
    /// Latest known good value
    pub current: Option<Arc<T>>,
    /// Failure behind the last transition to Degraded, cleared on success
    pub last_error: Option<PollError>,
    /// Failed requests since the last success
    pub consecutive_failures: u32,
    /// When `current` was fetched
    pub fetched_at: Option<Instant>,
    /// Threshold after which `current` counts as stale
    pub stale_after: Duration,
}

// Manual impl: `T` itself need not be Clone behind the Arc
impl<T> Clone for PollSnapshot<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state,
            current: self.current.clone(),
            last_error: self.last_error.clone(),
            consecutive_failures: self.consecutive_failures,
            fetched_at: self.fetched_at,
            stale_after: self.stale_after,
        }
    }
}

impl<T> PollSnapshot<T> {
    /// Fresh snapshot before any fetch
    #[must_use]
    pub fn idle(stale_after: Duration) -> Self {
        Self {
            state: PollState::Idle,
            current: None,
            last_error: None,
            consecutive_failures: 0,
            fetched_at: None,
            stale_after,
        }
    }

    /// Whether a fetch is running and nothing is available to show yet
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.current.is_none() && matches!(self.state, PollState::Idle | PollState::Fetching)
    }

    /// Whether the last transition was a failure
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.state == PollState::Degraded
    }

    /// Age of `current`, if any
    #[must_use]
    pub fn age(&self) -> Option<Duration> {
        self.fetched_at.map(|at| at.elapsed())
    }

    /// Rendering hint: `current` is missing or older than the threshold
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.age().map_or(true, |age| age > self.stale_after)
    }
}
