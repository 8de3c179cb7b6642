//! Why a remote assistant call did not produce a usable answer

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    /// No remote backend configured
    #[error("Assistant service unavailable")]
    Unavailable,

    #[error("Assistant returned HTTP {status}")]
    Status { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unreadable response: {0}")]
    Parse(String),

    /// Response parsed but failed validation
    #[error("Response rejected: {0}")]
    Rejected(String),
}

impl FailureReason {
    /// Whether another attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FailureReason::Unavailable)
    }
}

impl From<reqwest::Error> for FailureReason {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FailureReason::Parse(err.to_string())
        } else {
            FailureReason::Transport(err.to_string())
        }
    }
}
