//! Remote service error types.

use thiserror::Error;

/// Errors that can occur when calling the report or consultation service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (missing or invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The service refused the payload (4xx other than auth and rate limits).
    #[error("request rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The service failed (5xx) or answered with something unreadable.
    #[error("service error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl ServiceError {
    /// Errors that will not go away by sending the same request again.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ServiceError::AuthenticationFailed(_) | ServiceError::Rejected { .. }
        )
    }
}
