//! Fetch error taxonomy.
//!
//! Every failure of a remote request is classified into one of four kinds.
//! Errors are recorded inside store entries, so they are cheap to clone and
//! comparable.

use serde::Serialize;
use thiserror::Error;

/// Errors produced by a remote fetch.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FetchError {
    /// Transport failure (connection refused, timeout, reset)
    #[error("network error: {0}")]
    Network(String),

    /// Request rejected for lack of credentials or permissions
    #[error("not authorized ({status}): {message}")]
    Auth { status: u16, message: String },

    /// Resource does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other non-success response, including undecodable bodies
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
}

impl FetchError {
    /// Create a Network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Create an Auth error.
    pub fn auth(status: u16, message: impl Into<String>) -> Self {
        Self::Auth {
            status,
            message: message.into(),
        }
    }

    /// Create a NotFound error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a Server error.
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            401 | 403 => Self::auth(status, message),
            404 => Self::not_found(message),
            _ => Self::server(status, message),
        }
    }

    /// Whether repeating the same request could succeed.
    ///
    /// Auth and not-found failures need user action first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Server { .. })
    }

    /// HTTP status attached to the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { status, .. } | Self::Server { status, .. } => Some(*status),
            Self::NotFound(_) => Some(404),
            Self::Network(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status() {
        assert!(matches!(
            FetchError::from_status(401, "expired"),
            FetchError::Auth { status: 401, .. }
        ));
        assert!(matches!(
            FetchError::from_status(403, "forbidden"),
            FetchError::Auth { status: 403, .. }
        ));
        assert!(matches!(
            FetchError::from_status(404, "gone"),
            FetchError::NotFound(_)
        ));
        assert!(matches!(
            FetchError::from_status(502, "bad gateway"),
            FetchError::Server { status: 502, .. }
        ));
    }

    #[test]
    fn test_retryable() {
        assert!(FetchError::network("reset").is_retryable());
        assert!(FetchError::server(500, "boom").is_retryable());
        assert!(!FetchError::auth(401, "no").is_retryable());
        assert!(!FetchError::not_found("e1").is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = FetchError::server(500, "Internal server error");
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("Internal server error"));
        assert_eq!(err.status(), Some(500));
        assert_eq!(FetchError::network("timeout").status(), None);
    }
}
