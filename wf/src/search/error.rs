//! Search error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to the search backend
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Backend error {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("Stream reported error: {0}")]
    Stream(String),

    #[error("Backend returned an empty result")]
    EmptyResult,
}

/// Coarse classification used for logging and routing decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Protocol,
    Timeout,
    Backend,
    EmptyResult,
}

impl SearchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SearchError::Transport(_) | SearchError::Network(_) => ErrorKind::Transport,
            SearchError::Protocol(_) | SearchError::Json(_) => ErrorKind::Protocol,
            SearchError::Timeout(_) => ErrorKind::Timeout,
            SearchError::Backend { .. } | SearchError::Stream(_) => ErrorKind::Backend,
            SearchError::EmptyResult => ErrorKind::EmptyResult,
        }
    }

    /// Check if this is a watchdog expiry
    pub fn is_timeout(&self) -> bool {
        matches!(self, SearchError::Timeout(_))
    }

    /// HTTP status of a backend rejection, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            SearchError::Backend { status, .. } => Some(*status),
            SearchError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
