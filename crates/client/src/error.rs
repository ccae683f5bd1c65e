//! Client error types.

use storefront_core::StorageError;
use thiserror::Error;

/// Errors surfaced by the storefront client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The session could not be renewed, or the renewed credential was
    /// rejected too. Stored credentials have been cleared.
    #[error("Session expired, please log in again")]
    AuthExpired,

    /// The backend answered with a non-success status.
    #[error("{message} (HTTP {status})")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Message from the response body, or a generic fallback.
        message: String,
    },

    /// A handle was used after the object it refers to was dropped.
    #[error("{0} used outside of its owning context")]
    MissingContext(&'static str),

    /// Transport-level failure (connection, TLS, body read).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not the expected JSON.
    #[error("JSON decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Durable storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ClientError {
    /// HTTP status carried by the error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::AuthExpired => Some(401),
            _ => None,
        }
    }
}

/// Why a session renewal failed.
///
/// Cloneable so every caller waiting on a shared renewal receives the same
/// outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenewalError {
    /// No renewal credential is stored.
    #[error("no refresh token stored")]
    NoRefreshToken,

    /// The renewal endpoint refused the credential.
    #[error("token refresh rejected with HTTP {0}")]
    Rejected(u16),

    /// The renewal request did not complete.
    #[error("token refresh failed: {0}")]
    Transport(String),

    /// The new credentials could not be stored.
    #[error("could not store refreshed tokens: {0}")]
    Storage(String),
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_display() {
        let err = ClientError::Http {
            status: 404,
            message: "Product not found".to_string(),
        };
        assert_eq!(err.to_string(), "Product not found (HTTP 404)");
        assert_eq!(err.status(), Some(404));

        assert_eq!(
            ClientError::AuthExpired.to_string(),
            "Session expired, please log in again"
        );
    }

    #[test]
    fn test_missing_context_display() {
        let err = ClientError::MissingContext("CartHandle");
        assert_eq!(err.to_string(), "CartHandle used outside of its owning context");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_renewal_error_display() {
        assert_eq!(
            RenewalError::Rejected(403).to_string(),
            "token refresh rejected with HTTP 403"
        );
    }
}
