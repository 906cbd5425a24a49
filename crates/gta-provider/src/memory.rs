//! In-memory implementation of the PolicyClient trait.
//!
//! This is primarily for testing. It follows the remote semantics (etags,
//! wholesale replacement, unknown projects) and adds failure injection and
//! a write log so tests can observe exactly what was sent.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use gta_core::Policy;

use crate::error::{ProviderError, Result};
use crate::traits::PolicyClient;

/// In-memory policy client.
///
/// All data is lost when the client is dropped. Thread-safe via RwLock.
pub struct MemoryPolicyClient {
    inner: RwLock<MemoryClientInner>,
}

struct MemoryClientInner {
    /// Stored policies by project.
    policies: HashMap<String, Policy>,

    /// Identity reported by `current_identity`.
    identity: Option<String>,

    /// Remaining gets / sets that fail before succeeding again.
    failing_gets: usize,
    failing_sets: usize,

    /// Counter used to mint etags.
    revision: u64,

    get_count: usize,

    /// Every accepted write, in order.
    writes: Vec<(String, Policy)>,
}

impl MemoryPolicyClient {
    /// Create a client with no projects and no identity.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryClientInner {
                policies: HashMap::new(),
                identity: None,
                failing_gets: 0,
                failing_sets: 0,
                revision: 0,
                get_count: 0,
                writes: Vec::new(),
            }),
        }
    }

    /// Set the identity reported as the current user.
    pub fn with_identity(self, identity: impl Into<String>) -> Self {
        if let Ok(mut inner) = self.inner.write() {
            inner.identity = Some(identity.into());
        }
        self
    }

    /// Register a project with an empty policy.
    pub fn with_project(self, project: impl Into<String>) -> Self {
        self.with_policy(project, Policy::default())
    }

    /// Register a project with the given policy.
    pub fn with_policy(self, project: impl Into<String>, policy: Policy) -> Self {
        if let Ok(mut inner) = self.inner.write() {
            let etag = inner.next_etag();
            let mut policy = policy;
            policy.etag.get_or_insert(etag);
            inner.policies.insert(project.into(), policy);
        }
        self
    }

    /// Snapshot of a project's stored policy.
    pub fn policy(&self, project: &str) -> Option<Policy> {
        self.read().ok()?.policies.get(project).cloned()
    }

    /// Make the next `n` calls to `get_policy` fail.
    pub fn fail_next_gets(&self, n: usize) {
        if let Ok(mut inner) = self.write() {
            inner.failing_gets = n;
        }
    }

    /// Make the next `n` calls to `set_policy` fail.
    pub fn fail_next_sets(&self, n: usize) {
        if let Ok(mut inner) = self.write() {
            inner.failing_sets = n;
        }
    }

    /// Number of `get_policy` calls so far, failed ones included.
    pub fn get_count(&self) -> usize {
        self.read().map(|i| i.get_count).unwrap_or(0)
    }

    /// Number of accepted writes.
    pub fn write_count(&self) -> usize {
        self.read().map(|i| i.writes.len()).unwrap_or(0)
    }

    /// Every accepted write as `(project, policy sent)`.
    pub fn writes(&self) -> Vec<(String, Policy)> {
        self.read().map(|i| i.writes.clone()).unwrap_or_default()
    }

    /// Replace a stored policy behind the client's back, minting a new etag.
    ///
    /// Simulates a concurrent writer.
    pub fn mutate_policy(&self, project: &str, f: impl FnOnce(&mut Policy)) -> Result<()> {
        let mut inner = self.write()?;
        let etag = inner.next_etag();
        let policy = inner
            .policies
            .get_mut(project)
            .ok_or_else(|| ProviderError::NotFound(project.to_string()))?;
        f(policy);
        policy.etag = Some(etag);
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryClientInner>> {
        self.inner
            .read()
            .map_err(|e| ProviderError::Unavailable(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryClientInner>> {
        self.inner
            .write()
            .map_err(|e| ProviderError::Unavailable(format!("lock poisoned: {e}")))
    }
}

impl MemoryClientInner {
    fn next_etag(&mut self) -> String {
        self.revision += 1;
        format!("etag-{}", self.revision)
    }
}

impl Default for MemoryPolicyClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PolicyClient for MemoryPolicyClient {
    async fn get_policy(&self, project: &str) -> Result<Policy> {
        let mut inner = self.write()?;
        inner.get_count += 1;

        if inner.failing_gets > 0 {
            inner.failing_gets -= 1;
            return Err(ProviderError::Unavailable("injected get failure".into()));
        }

        inner
            .policies
            .get(project)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(project.to_string()))
    }

    async fn set_policy(&self, project: &str, policy: &Policy) -> Result<Policy> {
        let mut inner = self.write()?;

        if inner.failing_sets > 0 {
            inner.failing_sets -= 1;
            return Err(ProviderError::Unavailable("injected set failure".into()));
        }

        let stored_etag = inner
            .policies
            .get(project)
            .ok_or_else(|| ProviderError::NotFound(project.to_string()))?
            .etag
            .clone();

        // A missing etag means "overwrite unconditionally", as on the real API.
        if let (Some(sent), Some(stored)) = (&policy.etag, &stored_etag) {
            if sent != stored {
                return Err(ProviderError::Conflict(format!(
                    "etag {sent} does not match current {stored}"
                )));
            }
        }

        let mut stored = policy.clone();
        stored.etag = Some(inner.next_etag());
        inner.writes.push((project.to_string(), policy.clone()));
        inner.policies.insert(project.to_string(), stored.clone());

        Ok(stored)
    }

    async fn current_identity(&self) -> Result<String> {
        self.read()?
            .identity
            .clone()
            .ok_or_else(|| ProviderError::Identity("no email found in credentials".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gta_core::{Binding, Member, Role};

    fn owner_binding() -> Binding {
        Binding::new(
            Role::normalize("owner").unwrap(),
            vec![Member::from_identity("o@example.com").unwrap()],
        )
    }

    #[tokio::test]
    async fn test_memory_client_roundtrip() {
        let client = MemoryPolicyClient::new().with_project("p");

        let mut policy = client.get_policy("p").await.unwrap();
        let etag_before = policy.etag.clone();
        policy.add_binding(owner_binding());

        let stored = client.set_policy("p", &policy).await.unwrap();
        assert_ne!(stored.etag, etag_before);
        assert_eq!(client.policy("p").unwrap().bindings.len(), 1);
        assert_eq!(client.write_count(), 1);
    }

    #[tokio::test]
    async fn test_memory_client_unknown_project() {
        let client = MemoryPolicyClient::new();
        let err = client.get_policy("missing").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_memory_client_stale_etag_conflicts() {
        let client = MemoryPolicyClient::new().with_project("p");
        let policy = client.get_policy("p").await.unwrap();

        client
            .mutate_policy("p", |p| p.add_binding(owner_binding()))
            .unwrap();

        let err = client.set_policy("p", &policy).await.unwrap_err();
        assert!(matches!(err, ProviderError::Conflict(_)));
        assert_eq!(client.policy("p").unwrap().bindings.len(), 1);
    }

    #[tokio::test]
    async fn test_memory_client_failure_injection() {
        let client = MemoryPolicyClient::new().with_project("p");
        client.fail_next_gets(1);
        client.fail_next_sets(1);

        assert!(client.get_policy("p").await.is_err());
        let policy = client.get_policy("p").await.unwrap();
        assert!(client.set_policy("p", &policy).await.is_err());
        assert!(client.set_policy("p", &policy).await.is_ok());
        assert_eq!(client.get_count(), 2);
        assert_eq!(client.write_count(), 1);
    }

    #[tokio::test]
    async fn test_memory_client_identity() {
        let anonymous = MemoryPolicyClient::new();
        assert!(matches!(
            anonymous.current_identity().await,
            Err(ProviderError::Identity(_))
        ));

        let client = MemoryPolicyClient::new().with_identity("me@example.com");
        assert_eq!(client.current_identity().await.unwrap(), "me@example.com");
    }
}
