//! PolicyClient trait: the abstract interface over the remote policy API.
//!
//! This trait keeps the binding manager backend-agnostic. Implementations
//! include Cloud Resource Manager over HTTP and an in-memory client for tests.

use async_trait::async_trait;
use gta_core::Policy;

use crate::error::Result;

/// Async interface over a project's IAM policy.
///
/// # Design Notes
///
/// - **Fresh reads**: implementations must not cache; every `get_policy`
///   reflects the remote state at call time.
/// - **Wholesale writes**: `set_policy` replaces bindings and etag entirely.
/// - **Conditional support**: `get_policy` requests the schema version that
///   includes conditional bindings, so conditions are never stripped.
#[async_trait]
pub trait PolicyClient: Send + Sync {
    /// Fetch the current policy of a project.
    async fn get_policy(&self, project: &str) -> Result<Policy>;

    /// Replace the policy of a project.
    ///
    /// Returns the policy as stored by the remote (with its new etag).
    async fn set_policy(&self, project: &str, policy: &Policy) -> Result<Policy>;

    /// Email of the identity whose credentials the client uses.
    async fn current_identity(&self) -> Result<String>;
}

#[async_trait]
impl<C: PolicyClient + ?Sized> PolicyClient for std::sync::Arc<C> {
    async fn get_policy(&self, project: &str) -> Result<Policy> {
        (**self).get_policy(project).await
    }

    async fn set_policy(&self, project: &str, policy: &Policy) -> Result<Policy> {
        (**self).set_policy(project, policy).await
    }

    async fn current_identity(&self) -> Result<String> {
        (**self).current_identity().await
    }
}
