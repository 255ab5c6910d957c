//! Error types for remote API calls.

use crate::rate_limiter::RateLimitExceeded;
use std::fmt;
use thiserror::Error;

/// The single normalized failure of a remote call.
///
/// `status` is present only when the remote actually answered. The message
/// already carries the distinction between "answered with an error", "never
/// answered" and "request could not be built".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status code, when a response was received.
    pub status: Option<u16>,
    /// Human-readable failure description.
    pub message: String,
}

impl ApiError {
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn without_status(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "API error ({}): {}", status, self.message),
            None => write!(f, "API error: {}", self.message),
        }
    }
}

impl std::error::Error for ApiError {}

/// Everything that can stop an outbound call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// The local sliding window is full; nothing was sent.
    #[error(transparent)]
    RateLimited(#[from] RateLimitExceeded),

    /// The remote call was attempted and failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Result type alias using ClientError.
pub type ClientResult<T> = Result<T, ClientError>;
