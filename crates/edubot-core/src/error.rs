//! Error types shared across edubot.
//!
//! `ProviderError` lives here rather than in `edubot-providers` so the chat
//! service can classify generation failures for its retry policy without
//! string matching.

use thiserror::Error;

/// Errors that can occur when calling a text-generation provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The provider answered but the completion carried no text.
    #[error("provider returned an empty completion")]
    EmptyResponse,
}

impl ProviderError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ProviderError::AuthenticationFailed(_) | ProviderError::ModelNotFound(_)
        )
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ProviderError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}

/// Errors surfaced by progress tracking.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProgressError {
    /// No session has ever been recorded for this student.
    #[error("student not found: {0}")]
    NotFound(String),

    /// A session-update payload was rejected before reaching the tracker.
    #[error("invalid session update: {0}")]
    InvalidInput(String),
}
