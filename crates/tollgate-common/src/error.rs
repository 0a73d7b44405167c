//! Common error types for Tollgate components.

use thiserror::Error;

/// Common errors across Tollgate components
#[derive(Debug, Error)]
pub enum GateError {
    /// Verification provider unreachable or returned an unusable reply
    #[error("Verification provider error: {0}")]
    Provider(String),

    /// Upstream origin unreachable
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Invalid input/request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GateError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Provider(_) => 502,
            Self::Upstream(_) => 502,
            Self::InvalidInput(_) => 400,
            Self::Internal(_) => 500,
        }
    }

    /// Client-facing message. Never includes the inner detail.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::Internal(_) => "internal error",
            Self::Provider(_) => "verification provider unavailable",
            Self::Upstream(_) => "upstream unavailable",
            Self::InvalidInput(_) => "invalid request",
        }
    }
}
