//! Error types for the binding manager.

use gta_core::CoreError;
use gta_provider::ProviderError;
use thiserror::Error;

use crate::report::RoleFailure;

/// Errors that can occur during manager operations.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// Invalid input or policy data.
    #[error("{0}")]
    Core(#[from] CoreError),

    /// The policy API failed.
    #[error("{0}")]
    Provider(#[from] ProviderError),

    /// No member was given and the current identity could not be resolved.
    #[error("failed to resolve current user: {0}")]
    Identity(#[source] ProviderError),

    /// Every requested role failed.
    #[error("failed to grant any roles: {}", join_failures(.0))]
    NoRolesGranted(Vec<RoleFailure>),

    /// Every attempted revocation failed.
    #[error("failed to revoke any roles: {}", join_failures(.0))]
    NoRolesRevoked(Vec<RoleFailure>),

    /// Invalid operation.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

fn join_failures(failures: &[RoleFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for manager operations.
pub type Result<T> = std::result::Result<T, ManagerError>;
