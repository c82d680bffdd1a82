//! Submission errors

use thiserror::Error;

use crate::domain::QueryError;
use crate::store::StoreError;

/// Why a submission was refused or could not be committed
///
/// Search failures never surface here; they end in fallback or apology text.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Invalid query: {0}")]
    InvalidQuery(#[from] QueryError),

    #[error("Session {0} is busy with another query")]
    Busy(String),

    #[error("Failed to commit results: {0}")]
    Store(#[from] StoreError),
}

impl SubmitError {
    /// Rejected before anything was sent or shown
    pub fn is_rejection(&self) -> bool {
        matches!(self, SubmitError::InvalidQuery(_) | SubmitError::Busy(_))
    }
}
