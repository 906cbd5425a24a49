//! Typed outcomes of manager operations.

use std::fmt;

use serde::Serialize;

use gta_core::{GrantedRole, Member, Role, TemporaryBinding};

/// A role that could not be granted or revoked, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleFailure {
    pub role: String,
    pub error: String,
}

impl RoleFailure {
    pub fn new(role: impl Into<String>, error: impl ToString) -> Self {
        Self {
            role: role.into(),
            error: error.to_string(),
        }
    }
}

impl fmt::Display for RoleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.role, self.error)
    }
}

/// Outcome of [`BindingManager::grant`](crate::BindingManager::grant).
#[derive(Debug, Clone, Serialize)]
pub struct GrantReport {
    /// The member the roles were granted to.
    pub member: Member,
    /// Bindings created by this call.
    pub granted: Vec<GrantedRole>,
    /// Roles that would have been granted, in dry-run mode.
    pub planned: Vec<Role>,
    pub failures: Vec<RoleFailure>,
}

impl GrantReport {
    pub(crate) fn new(member: Member) -> Self {
        Self {
            member,
            granted: Vec::new(),
            planned: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Roles granted, or planned when nothing was written.
    pub fn succeeded(&self) -> usize {
        self.granted.len() + self.planned.len()
    }
}

/// Outcome of [`BindingManager::revoke`](crate::BindingManager::revoke).
#[derive(Debug, Clone, Default, Serialize)]
pub struct RevokeReport {
    pub revoked: Vec<GrantedRole>,
    /// Grants whose binding or member was no longer in the policy.
    pub already_gone: Vec<GrantedRole>,
    /// Grants that would have been revoked, in dry-run mode.
    pub planned: Vec<GrantedRole>,
    pub failures: Vec<RoleFailure>,
}

impl RevokeReport {
    pub fn succeeded(&self) -> usize {
        self.revoked.len() + self.already_gone.len() + self.planned.len()
    }
}

/// Outcome of [`BindingManager::clean`](crate::BindingManager::clean).
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanReport {
    /// Every matched (binding, member) pair.
    pub matches: Vec<TemporaryBinding>,
    /// Members actually removed; zero in dry-run mode.
    pub removed: usize,
    pub dry_run: bool,
}
