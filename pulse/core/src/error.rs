//! Error Types
//!
//! Every failure the client can produce, from a caller-side precondition
//! violation to a broken server contract.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::SchemaError;

/// Errors produced by the API client and everything layered on it
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PulseError {
    /// The server answered with a non-2xx status
    #[error("server returned HTTP {status}")]
    Transport {
        /// HTTP status code
        status: u16,
    },

    /// The response body did not match the expected shape
    #[error("schema validation failed: {0}")]
    SchemaValidation(#[from] SchemaError),

    /// The caller passed an argument that can never succeed
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The request could not be sent or completed
    #[error("network error: {0}")]
    Network(String),
}

impl PulseError {
    /// Coarse classification, suitable for storing as a state flag
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { .. } => ErrorKind::Transport,
            Self::SchemaValidation(_) => ErrorKind::SchemaValidation,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Network(_) => ErrorKind::Network,
        }
    }

    /// Whether a retry has any chance of producing a different outcome
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

impl From<reqwest::Error> for PulseError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Self::Transport {
                status: status.as_u16(),
            },
            None => Self::Network(e.to_string()),
        }
    }
}

/// Copyable error classification
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Non-2xx HTTP status
    Transport,
    /// Malformed payload
    SchemaValidation,
    /// Caller-side precondition violation
    InvalidArgument,
    /// Request could not be sent or completed
    Network,
}

impl ErrorKind {
    /// Transient kinds are retried; a broken contract or bad input is not
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Transport | Self::Network)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Transport => "transport",
            Self::SchemaValidation => "schema_validation",
            Self::InvalidArgument => "invalid_argument",
            Self::Network => "network",
        };
        f.write_str(s)
    }
}

/// Result alias for client operations
pub type Result<T> = std::result::Result<T, PulseError>;
