//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;

use gta_core::temporary::expiry_expression;
use gta_core::{Binding, BindingId, BindingIdGenerator, Expr, Member, Policy, Role};
use gta_provider::MemoryPolicyClient;

/// Project every fixture registers.
pub const TEST_PROJECT: &str = "test-project";

/// Identity the fixture client reports as the current user.
pub const TEST_IDENTITY: &str = "tester@example.com";

/// An in-memory policy client seeded with one empty project.
pub struct TestFixture {
    pub client: Arc<MemoryPolicyClient>,
    pub project: String,
    ids: Mutex<BindingIdGenerator>,
}

impl TestFixture {
    /// Fixture whose client knows [`TEST_IDENTITY`].
    pub fn new() -> Self {
        Self::from_client(
            MemoryPolicyClient::new()
                .with_identity(TEST_IDENTITY)
                .with_project(TEST_PROJECT),
        )
    }

    /// Fixture whose client cannot resolve the current identity.
    pub fn anonymous() -> Self {
        Self::from_client(MemoryPolicyClient::new().with_project(TEST_PROJECT))
    }

    /// Fixture starting from an existing policy document.
    pub fn with_policy(policy: Policy) -> Self {
        Self::from_client(
            MemoryPolicyClient::new()
                .with_identity(TEST_IDENTITY)
                .with_policy(TEST_PROJECT, policy),
        )
    }

    fn from_client(client: MemoryPolicyClient) -> Self {
        Self {
            client: Arc::new(client),
            project: TEST_PROJECT.to_string(),
            ids: Mutex::new(BindingIdGenerator::new()),
        }
    }

    /// A new handle on the shared client.
    pub fn client(&self) -> Arc<MemoryPolicyClient> {
        Arc::clone(&self.client)
    }

    /// Current stored policy of the fixture project.
    pub fn policy(&self) -> Policy {
        self.client
            .policy(&self.project)
            .expect("fixture project is registered")
    }

    /// Add an unconditional binding.
    pub fn seed_binding(&self, role: &str, members: &[&str]) {
        let binding = Binding::new(
            Role::from_policy(role),
            members.iter().map(|m| Member::from_policy(*m)).collect(),
        );
        self.push(binding);
    }

    /// Add a temporary binding for `member` expiring `hours` from now.
    ///
    /// Negative values produce an already expired binding.
    pub fn seed_temporary(&self, role: &str, member: &str, hours: i64) -> BindingId {
        self.seed_temporary_members(role, &[member], hours)
    }

    /// Add one temporary binding shared by several members.
    pub fn seed_temporary_members(&self, role: &str, members: &[&str], hours: i64) -> BindingId {
        let now = Utc::now();
        let id = self.ids.lock().expect("fixture id lock").next_id(now);
        let expires_at = now + chrono::Duration::hours(hours);

        let mut binding = Binding::new(
            Role::from_policy(role),
            members.iter().map(|m| Member::from_policy(*m)).collect(),
        );
        binding.condition = Some(Expr {
            title: id.as_str().to_string(),
            description: Some("seeded by fixture".into()),
            expression: expiry_expression(expires_at),
            location: None,
        });
        self.push(binding);
        id
    }

    /// Add a conditional binding whose condition this tool does not own.
    pub fn seed_foreign_condition(&self, role: &str, member: &str, title: &str) {
        let mut binding = Binding::new(Role::from_policy(role), vec![Member::from_policy(member)]);
        binding.condition = Some(Expr {
            title: title.to_string(),
            description: None,
            expression: "resource.name.startsWith('projects/_/buckets/logs')".into(),
            location: None,
        });
        self.push(binding);
    }

    fn push(&self, binding: Binding) {
        self.client
            .mutate_policy(&self.project, |p| p.add_binding(binding))
            .expect("fixture project is registered");
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// One hour, the default grant duration.
pub const HOUR: Duration = Duration::from_secs(3600);
