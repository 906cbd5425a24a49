//! Error types for gta core.

use thiserror::Error;

/// Errors that can occur while building or interpreting policy data.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid duration '{input}': {reason}")]
    InvalidDuration { input: String, reason: String },

    #[error("empty role name")]
    EmptyRole,

    #[error("empty member identity")]
    EmptyMember,

    #[error("malformed condition expression: {0}")]
    MalformedExpression(String),

    #[error("expiry out of range: now + {0:?}")]
    ExpiryOutOfRange(std::time::Duration),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
