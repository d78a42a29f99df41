//! Client error types.

use thiserror::Error;

use zaulimi_core::CartError;

/// Errors returned by the API client and cart cache.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The base URL could not be parsed or cannot carry a path.
    #[error("invalid base URL: {0}")]
    InvalidUrl(String),

    /// The request never got an HTTP response.
    #[error("request failed: {0}")]
    Request(String),

    /// A response arrived but its body was not what was expected.
    #[error("unexpected response: {0}")]
    Response(String),

    /// The server answered with a non-success status.
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// The server's `message` field, or the status reason.
        message: String,
    },

    /// The change was rejected locally before reaching the server.
    #[error("cart error: {0}")]
    Cart(#[from] CartError),
}

impl ClientError {
    /// HTTP status, if the server answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
