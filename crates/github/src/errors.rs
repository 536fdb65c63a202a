//! Errors raised by the GitHub adapter.

use std::time::Duration;

use thiserror::Error;

/// Failure of a GitHub API interaction.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// The App private key could not be parsed as an RSA PEM key.
    #[error("Invalid App private key: {message}")]
    InvalidPrivateKey { message: String },

    /// The App JWT could not be signed.
    #[error("Failed to sign App JWT: {message}")]
    Signing { message: String },

    /// 401: the JWT or token was rejected.
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// 403 without rate-limit headers.
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// 404.
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    /// 403 or 429 with rate-limit headers.
    #[error("Rate limited; retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    /// 5xx.
    #[error("GitHub server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Any other unsuccessful status.
    #[error("GitHub API error {status}: {message}")]
    ApiError { status: u16, message: String },

    /// The request never produced a response, or the body was unreadable.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),
}
