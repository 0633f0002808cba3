//! Client error types.

use thiserror::Error;

/// Errors raised while setting up a client. Request failures are reported
/// as [`FetchError`](xrefcache_core::FetchError) instead.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] xrefcache_config::ConfigError),

    /// Base URL could not be parsed
    #[error("invalid API url '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// HTTP client could not be built
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

impl ClientError {
    /// Create an InvalidUrl error.
    pub fn invalid_url(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            message: message.into(),
        }
    }
}
