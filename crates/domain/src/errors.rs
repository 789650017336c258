//! Error types used throughout the workspace

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for oshub
///
/// The first five variants form the upload/match taxonomy; `Config` and
/// `InvalidInput` cover problems detected before any request is issued.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum OshError {
    /// Network or connectivity failure reported by the transport. Never
    /// retried by the core.
    #[error("Transport error: {0}")]
    Transport(String),

    /// HTTP 429 responses consumed the whole timeout budget.
    #[error("Request throttled: timeout budget of {budget_secs}s exhausted")]
    ThrottledTimeout { budget_secs: f64 },

    /// Confirm/reject attempted on a match that is not pending.
    #[error("Match {match_id} is {state}, expected PENDING")]
    InvalidState { match_id: u64, state: String },

    /// Any status other than 200/201/429.
    #[error("Remote error (HTTP {status}): {detail}")]
    Remote { status: u16, detail: String },

    /// Body missing the fields its declared status requires.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl OshError {
    /// Stable label suitable for structured logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::ThrottledTimeout { .. } => "throttled_timeout",
            Self::InvalidState { .. } => "invalid_state",
            Self::Remote { .. } => "remote",
            Self::MalformedResponse(_) => "malformed_response",
            Self::Config(_) => "config",
            Self::InvalidInput(_) => "invalid_input",
        }
    }

    /// True when the failure came from the throttle budget running out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ThrottledTimeout { .. })
    }

    /// Human readable detail without the variant prefix.
    pub fn detail(&self) -> String {
        match self {
            Self::Remote { detail, .. } => detail.clone(),
            Self::Transport(message)
            | Self::MalformedResponse(message)
            | Self::Config(message)
            | Self::InvalidInput(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for oshub operations
pub type Result<T> = std::result::Result<T, OshError>;
