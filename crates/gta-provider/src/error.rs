//! Error types for the provider module.

use thiserror::Error;

/// Errors that can occur while talking to the policy API.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport-level HTTP failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("api error {status}: {message}")]
    Api { status: u16, message: String },

    /// Project (or its policy) does not exist or is not visible.
    #[error("project not found: {0}")]
    NotFound(String),

    /// The policy changed since it was fetched.
    #[error("policy conflict: {0}")]
    Conflict(String),

    /// The current identity could not be determined.
    #[error("identity error: {0}")]
    Identity(String),

    /// No access token could be obtained.
    #[error("token error: {0}")]
    Token(String),

    /// Body serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backend is not able to serve requests.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Result type for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;
