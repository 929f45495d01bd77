//! Error taxonomy for the engine
//!
//! Every failure surfaced to a caller is one of these variants. The engine
//! never retries internally; [`Error::is_retryable`] tells the calling layer
//! whether a retry can possibly succeed.

use thiserror::Error;

use crate::Identifier;

/// Errors that can occur in SkillScope operations
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed entity, filter, or query. Caller fault, never retried.
    #[error("validation error: {0}")]
    Validation(String),

    /// An encoding-service call failed. Retryable.
    #[error("encoding failed: {0}")]
    Encoding(String),

    /// A vector-repository call failed. Retryable, possibly transient.
    #[error("storage failure: {0}")]
    Storage(String),

    /// A retrieval branch failed during a hybrid search. Retryable.
    #[error("search failed: {0}")]
    Search(String),

    /// Point lookup miss. Terminal for the request.
    #[error("entity not found: {0}")]
    NotFound(Identifier),
}

impl Error {
    /// Whether the calling layer may retry the failed operation.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Encoding(_) | Error::Storage(_) | Error::Search(_)
        )
    }
}

/// Result type for SkillScope operations
pub type Result<T> = std::result::Result<T, Error>;
