//! Error types for address lookup and enrichment transport

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The candidate could not be turned into a structured address
    #[error("Address lookup failed: {0}")]
    AddressLookupFailed(String),

    #[error("Provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid provider response: {0}")]
    Parse(String),

    #[error("Provider rejected request: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LookupError::Parse(err.to_string())
        } else {
            LookupError::Transport(err.to_string())
        }
    }
}

/// Invalid multi-match selection
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Outcome is not a multi-match")]
    NotMultiMatch,

    #[error("Match index {index} out of range ({count} candidates)")]
    IndexOutOfRange { index: usize, count: usize },
}
