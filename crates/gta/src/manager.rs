//! The binding manager: grant, revoke, list and clean temporary bindings.
//!
//! Every mutation is a read-modify-write of the whole project policy. The
//! fetched etag travels back with the write, so a concurrent change makes
//! the write fail instead of being silently overwritten.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, info, warn};

use gta_core::{
    format_ttl, Binding, BindingIdGenerator, GrantedRole, Member, MemberRemoval, Policy, Role,
    TemporaryBinding, TemporaryCondition,
};
use gta_provider::PolicyClient;

use crate::error::{ManagerError, Result};
use crate::report::{CleanReport, GrantReport, RevokeReport, RoleFailure};

/// Configuration for the manager.
#[derive(Debug, Clone, Default)]
pub struct ManagerConfig {
    /// Log what would change without writing any policy.
    pub dry_run: bool,
}

/// What to grant, to whom, for how long.
#[derive(Debug, Clone)]
pub struct GrantRequest {
    pub project: String,
    /// Role names, with or without the `roles/` prefix.
    pub roles: Vec<String>,
    /// Target identity; the current credentials' identity when `None`.
    pub member: Option<String>,
    pub ttl: Duration,
}

impl GrantRequest {
    pub fn new<I, R>(project: impl Into<String>, roles: I, ttl: Duration) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        Self {
            project: project.into(),
            roles: roles.into_iter().map(Into::into).collect(),
            member: None,
            ttl,
        }
    }

    /// Grant to `member` instead of the current identity.
    pub fn member(mut self, member: impl Into<String>) -> Self {
        self.member = Some(member.into());
        self
    }

    fn validate(&self) -> Result<()> {
        if self.project.trim().is_empty() {
            return Err(ManagerError::InvalidOperation("project is required".into()));
        }
        if self.roles.is_empty() {
            return Err(ManagerError::InvalidOperation(
                "at least one role is required".into(),
            ));
        }
        if self.ttl.is_zero() {
            return Err(ManagerError::InvalidOperation("ttl must be positive".into()));
        }
        Ok(())
    }
}

/// Outcome of revoking a single recorded grant.
enum RevokeOutcome {
    Removed,
    AlreadyGone,
}

/// Manages temporary bindings through a [`PolicyClient`].
///
/// The manager owns the session state: the list of grants it created and
/// the generator for their binding IDs. Only those grants are touched by
/// [`revoke`](Self::revoke).
pub struct BindingManager<C: PolicyClient> {
    client: C,
    config: ManagerConfig,
    /// Grants created by this session and not yet revoked.
    granted: Vec<GrantedRole>,
    ids: BindingIdGenerator,
}

impl<C: PolicyClient> BindingManager<C> {
    pub fn new(client: C, config: ManagerConfig) -> Self {
        Self {
            client,
            config,
            granted: Vec::new(),
            ids: BindingIdGenerator::new(),
        }
    }

    /// Grants created by this session and still awaiting revocation.
    pub fn granted_roles(&self) -> &[GrantedRole] {
        &self.granted
    }

    /// Resolve the target member: the given identity, or the caller's own.
    pub async fn resolve_member(&self, identity: Option<&str>) -> Result<Member> {
        match identity.map(str::trim).filter(|s| !s.is_empty()) {
            Some(identity) => Ok(Member::from_identity(identity)?),
            None => {
                let email = self
                    .client
                    .current_identity()
                    .await
                    .map_err(ManagerError::Identity)?;
                debug!(%email, "Resolved current identity");
                Ok(Member::from_identity(&email)?)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Grant / Revoke
    // ─────────────────────────────────────────────────────────────────────────

    /// Grant each requested role as its own temporary binding.
    ///
    /// Roles are processed in order and independently: a failed role is
    /// recorded in the report and the next one is attempted. The call fails
    /// only when no role at all succeeded.
    pub async fn grant(&mut self, request: &GrantRequest) -> Result<GrantReport> {
        request.validate()?;
        let member = self.resolve_member(request.member.as_deref()).await?;
        let project = request.project.as_str();
        let ttl = format_ttl(request.ttl);

        let mut report = GrantReport::new(member.clone());

        for raw in &request.roles {
            let role = match Role::normalize(raw) {
                Ok(role) => role,
                Err(e) => {
                    warn!(role = %raw, error = %e, "Failed to grant role");
                    report.failures.push(RoleFailure::new(raw.clone(), e));
                    continue;
                }
            };

            info!(
                "Granting role {} to {} in project {} for {}",
                role, member, project, ttl
            );

            if self.config.dry_run {
                info!(
                    "[DRY-RUN] Would grant role {} to {} in project {} for {}",
                    role, member, project, ttl
                );
                report.planned.push(role);
                continue;
            }

            match self.grant_role(project, &role, &member, request.ttl).await {
                Ok(granted) => {
                    info!(
                        "Granted role {} (expires {})",
                        role,
                        rfc3339(granted.expires_at)
                    );
                    self.granted.push(granted.clone());
                    report.granted.push(granted);
                }
                Err(e) => {
                    warn!(role = %role, error = %e, "Failed to grant role");
                    report.failures.push(RoleFailure::new(role.as_str(), e));
                }
            }
        }

        if !report.failures.is_empty() {
            if report.succeeded() == 0 {
                return Err(ManagerError::NoRolesGranted(report.failures));
            }
            warn!(
                failed = report.failures.len(),
                "Failed to grant some roles, continuing with the rest"
            );
        }

        Ok(report)
    }

    async fn grant_role(
        &mut self,
        project: &str,
        role: &Role,
        member: &Member,
        ttl: Duration,
    ) -> Result<GrantedRole> {
        let mut policy = self.client.get_policy(project).await?;

        let now = Utc::now();
        let condition = TemporaryCondition::new(self.ids.next_id(now), now, ttl)?;
        policy.add_binding(Binding::temporary(role.clone(), member.clone(), &condition));

        self.write_policy(project, policy).await?;
        debug!(id = %condition.id, "Temporary binding created");

        Ok(GrantedRole::new(
            role.clone(),
            condition.id,
            condition.expires_at,
        ))
    }

    /// Revoke every grant this session created, for `member`.
    ///
    /// A grant whose binding has already disappeared counts as revoked.
    /// Grants that fail stay recorded so a later call can retry them. The
    /// call fails only when every attempted revocation failed.
    pub async fn revoke(&mut self, project: &str, member: &Member) -> Result<RevokeReport> {
        let mut report = RevokeReport::default();

        if self.granted.is_empty() {
            info!("No roles to revoke");
            return Ok(report);
        }

        let pending = std::mem::take(&mut self.granted);
        for grant in pending {
            info!(
                "Revoking role {} from {} in project {}",
                grant.role, member, project
            );

            if self.config.dry_run {
                info!(
                    "[DRY-RUN] Would revoke role {} from {} in project {}",
                    grant.role, member, project
                );
                report.planned.push(grant.clone());
                self.granted.push(grant);
                continue;
            }

            match self.revoke_grant(project, &grant, member).await {
                Ok(RevokeOutcome::Removed) => {
                    info!("Revoked role {}", grant.role);
                    report.revoked.push(grant);
                }
                Ok(RevokeOutcome::AlreadyGone) => {
                    warn!(
                        role = %grant.role,
                        id = %grant.id,
                        "Binding already removed, nothing to revoke"
                    );
                    report.already_gone.push(grant);
                }
                Err(e) => {
                    warn!(role = %grant.role, error = %e, "Failed to revoke role");
                    report
                        .failures
                        .push(RoleFailure::new(grant.role.as_str(), e));
                    self.granted.push(grant);
                }
            }
        }

        if !report.failures.is_empty() {
            if report.succeeded() == 0 {
                return Err(ManagerError::NoRolesRevoked(report.failures));
            }
            warn!(
                failed = report.failures.len(),
                "Failed to revoke some roles"
            );
        }

        Ok(report)
    }

    async fn revoke_grant(
        &self,
        project: &str,
        grant: &GrantedRole,
        member: &Member,
    ) -> Result<RevokeOutcome> {
        let mut policy = self.client.get_policy(project).await?;

        match policy.remove_member(&grant.role, &grant.id, member) {
            MemberRemoval::BindingNotFound | MemberRemoval::MemberNotPresent => {
                Ok(RevokeOutcome::AlreadyGone)
            }
            MemberRemoval::MemberRemoved | MemberRemoval::BindingDeleted => {
                self.write_policy(project, policy).await?;
                Ok(RevokeOutcome::Removed)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // List / Clean
    // ─────────────────────────────────────────────────────────────────────────

    /// Every temporary (binding, member) pair in the project, optionally for
    /// one member only.
    pub async fn list(
        &self,
        project: &str,
        member: Option<&Member>,
    ) -> Result<Vec<TemporaryBinding>> {
        let policy = self.client.get_policy(project).await?;
        let found = policy.temporary_bindings(member);

        if found.is_empty() {
            info!("No temporary bindings found");
        }
        for binding in &found {
            info!("Found temporary binding: {}", binding);
        }

        Ok(found)
    }

    /// Remove every temporary (binding, member) pair in the project,
    /// optionally for one member only, in a single policy write.
    ///
    /// Non-temporary bindings are never touched. In dry-run mode the matches
    /// are reported and nothing is written.
    pub async fn clean(&self, project: &str, member: Option<&Member>) -> Result<CleanReport> {
        let mut policy = self.client.get_policy(project).await?;
        let matches = policy.temporary_bindings(member);

        let mut report = CleanReport {
            matches: Vec::new(),
            removed: 0,
            dry_run: self.config.dry_run,
        };

        if matches.is_empty() {
            info!("No temporary bindings found to clean up");
            return Ok(report);
        }

        for binding in &matches {
            let prefix = if self.config.dry_run {
                "[DRY-RUN] Would remove"
            } else {
                "Found binding to remove"
            };
            info!("{}: {}", prefix, binding);
        }

        if self.config.dry_run {
            info!(
                "[DRY-RUN] Would clean up {} temporary binding(s)",
                matches.len()
            );
            report.matches = matches;
            return Ok(report);
        }

        let removed = policy.remove_temporary(&matches);
        self.write_policy(project, policy).await?;
        info!("Successfully cleaned up {} temporary binding(s)", removed);

        report.matches = matches;
        report.removed = removed;
        Ok(report)
    }

    /// Write a policy back, always at the conditional schema version.
    async fn write_policy(&self, project: &str, mut policy: Policy) -> Result<Policy> {
        policy.enable_conditions();
        Ok(self.client.set_policy(project, &policy).await?)
    }
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
