//! IAM policy documents.
//!
//! The policy is fetched and replaced wholesale; there is no partial update
//! API. Fields this crate does not model (`auditConfigs`, future additions)
//! are captured in `extra` so a fetch-mutate-write cycle never drops them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::principal::{Member, Role};
use crate::temporary::{parse_expiry, BindingId, TemporaryBinding, TemporaryCondition};

/// Policy schema version that permits conditional bindings.
pub const CONDITIONAL_POLICY_VERSION: i32 = 3;

/// A project IAM policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    /// Schema version. Must be [`CONDITIONAL_POLICY_VERSION`] on write.
    #[serde(default)]
    pub version: i32,

    /// Ordered role bindings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<Binding>,

    /// Opaque revision token used by the remote for optimistic concurrency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// Everything else the remote returned.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A role-to-members assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub role: Role,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<Member>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Expr>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A condition expression (Common Expression Language).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expr {
    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub expression: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Outcome of removing one member from one binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRemoval {
    /// No binding with that role and condition title exists.
    BindingNotFound,
    /// The binding exists but does not contain the member.
    MemberNotPresent,
    /// The member was removed and other members remain.
    MemberRemoved,
    /// The member was the last one, so the whole binding was deleted.
    BindingDeleted,
}

impl Binding {
    /// A binding without a condition.
    pub fn new(role: Role, members: Vec<Member>) -> Self {
        Self {
            role,
            members,
            condition: None,
            extra: Map::new(),
        }
    }

    /// A single-member binding gated by a temporary condition.
    pub fn temporary(role: Role, member: Member, condition: &TemporaryCondition) -> Self {
        Self {
            role,
            members: vec![member],
            condition: Some(condition.to_expr()),
            extra: Map::new(),
        }
    }

    /// The binding ID when this binding is tool-managed.
    pub fn temporary_id(&self) -> Option<BindingId> {
        self.condition
            .as_ref()
            .filter(|c| BindingId::is_temporary_title(&c.title))
            .map(|c| BindingId::from_title(c.title.clone()))
    }

    /// Whether this binding has the given role and condition title.
    pub fn matches(&self, role: &Role, id: &BindingId) -> bool {
        &self.role == role
            && self
                .condition
                .as_ref()
                .map(|c| c.title == id.as_str())
                .unwrap_or(false)
    }
}

impl Policy {
    /// Set the schema version required for conditional bindings.
    pub fn enable_conditions(&mut self) {
        self.version = CONDITIONAL_POLICY_VERSION;
    }

    /// Append a binding.
    pub fn add_binding(&mut self, binding: Binding) {
        self.bindings.push(binding);
    }

    /// Remove `member` from the binding identified by `role` and `id`.
    ///
    /// A binding left with no members is deleted.
    pub fn remove_member(&mut self, role: &Role, id: &BindingId, member: &Member) -> MemberRemoval {
        let Some(pos) = self.bindings.iter().position(|b| b.matches(role, id)) else {
            return MemberRemoval::BindingNotFound;
        };

        let binding = &mut self.bindings[pos];
        let before = binding.members.len();
        binding.members.retain(|m| m != member);

        if binding.members.len() == before {
            MemberRemoval::MemberNotPresent
        } else if binding.members.is_empty() {
            self.bindings.remove(pos);
            MemberRemoval::BindingDeleted
        } else {
            MemberRemoval::MemberRemoved
        }
    }

    /// Every (temporary binding, member) pair, optionally for one member only.
    pub fn temporary_bindings(&self, member: Option<&Member>) -> Vec<TemporaryBinding> {
        let mut found = Vec::new();

        for binding in &self.bindings {
            let (Some(id), Some(condition)) = (binding.temporary_id(), binding.condition.as_ref())
            else {
                continue;
            };
            let expires_at = parse_expiry(&condition.expression).ok();

            for m in &binding.members {
                if member.map(|want| want == m).unwrap_or(true) {
                    found.push(TemporaryBinding {
                        role: binding.role.clone(),
                        member: m.clone(),
                        id: id.clone(),
                        expires_at,
                        expression: condition.expression.clone(),
                    });
                }
            }
        }

        found
    }

    /// Remove the given (binding, member) pairs in one pass.
    ///
    /// Matches are identified by condition title, role and member rather than
    /// by position. Bindings emptied by the removal are dropped. Returns the
    /// number of members removed.
    pub fn remove_temporary(&mut self, matches: &[TemporaryBinding]) -> usize {
        let mut removed = 0;
        let bindings = std::mem::take(&mut self.bindings);

        for mut binding in bindings {
            let Some(id) = binding.temporary_id() else {
                self.bindings.push(binding);
                continue;
            };

            let before = binding.members.len();
            let role = binding.role.clone();
            binding.members.retain(|m| {
                !matches
                    .iter()
                    .any(|t| t.id == id && t.role == role && &t.member == m)
            });
            let dropped = before - binding.members.len();
            removed += dropped;

            if dropped > 0 && binding.members.is_empty() {
                continue;
            }
            self.bindings.push(binding);
        }

        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    fn role(r: &str) -> Role {
        Role::normalize(r).unwrap()
    }

    fn member(m: &str) -> Member {
        Member::from_identity(m).unwrap()
    }

    fn temp_binding(r: &str, nanos: i64, members: &[&str]) -> Binding {
        let cond = TemporaryCondition::new(
            BindingId::from_nanos(nanos),
            Utc.timestamp_opt(1_760_616_000, 0).unwrap(),
            Duration::from_secs(3600),
        )
        .unwrap();
        let mut b = Binding::temporary(role(r), member(members[0]), &cond);
        b.members = members.iter().map(|m| member(m)).collect();
        b
    }

    #[test]
    fn test_deserialize_preserves_unknown_fields() {
        let json = r#"{
            "version": 1,
            "etag": "BwXyz",
            "auditConfigs": [{"service": "allServices"}],
            "bindings": [{"role": "roles/owner", "members": ["user:o@example.com"]}]
        }"#;
        let policy: Policy = serde_json::from_str(json).unwrap();
        assert_eq!(policy.etag.as_deref(), Some("BwXyz"));
        assert!(policy.extra.contains_key("auditConfigs"));

        let back = serde_json::to_value(&policy).unwrap();
        assert_eq!(back["auditConfigs"][0]["service"], "allServices");
        assert_eq!(back["bindings"][0]["role"], "roles/owner");
        assert!(back["bindings"][0].get("condition").is_none());
    }

    #[test]
    fn test_enable_conditions() {
        let mut policy = Policy::default();
        policy.enable_conditions();
        assert_eq!(policy.version, CONDITIONAL_POLICY_VERSION);
    }

    #[test]
    fn test_remove_last_member_deletes_binding() {
        let mut policy = Policy::default();
        policy.add_binding(temp_binding("viewer", 1, &["a@example.com"]));

        let result = policy.remove_member(
            &role("viewer"),
            &BindingId::from_nanos(1),
            &member("a@example.com"),
        );
        assert_eq!(result, MemberRemoval::BindingDeleted);
        assert!(policy.bindings.is_empty());
    }

    #[test]
    fn test_remove_non_last_member_keeps_binding() {
        let mut policy = Policy::default();
        policy.add_binding(temp_binding("viewer", 1, &["a@example.com", "b@example.com"]));

        let result = policy.remove_member(
            &role("viewer"),
            &BindingId::from_nanos(1),
            &member("a@example.com"),
        );
        assert_eq!(result, MemberRemoval::MemberRemoved);
        assert_eq!(policy.bindings[0].members, vec![member("b@example.com")]);
    }

    #[test]
    fn test_remove_requires_role_and_id() {
        let mut policy = Policy::default();
        policy.add_binding(temp_binding("viewer", 1, &["a@example.com"]));

        let wrong_role = policy.remove_member(
            &role("editor"),
            &BindingId::from_nanos(1),
            &member("a@example.com"),
        );
        let wrong_id = policy.remove_member(
            &role("viewer"),
            &BindingId::from_nanos(2),
            &member("a@example.com"),
        );
        let wrong_member = policy.remove_member(
            &role("viewer"),
            &BindingId::from_nanos(1),
            &member("z@example.com"),
        );

        assert_eq!(wrong_role, MemberRemoval::BindingNotFound);
        assert_eq!(wrong_id, MemberRemoval::BindingNotFound);
        assert_eq!(wrong_member, MemberRemoval::MemberNotPresent);
        assert_eq!(policy.bindings.len(), 1);
    }

    #[test]
    fn test_temporary_bindings_skip_foreign_conditions() {
        let mut policy = Policy::default();
        policy.add_binding(Binding::new(role("owner"), vec![member("o@example.com")]));
        let mut foreign = Binding::new(role("viewer"), vec![member("f@example.com")]);
        foreign.condition = Some(Expr {
            title: "business hours".into(),
            expression: "request.time.getHours('UTC') < 17".into(),
            ..Expr::default()
        });
        policy.add_binding(foreign);
        policy.add_binding(temp_binding("editor", 7, &["a@example.com", "b@example.com"]));

        let all = policy.temporary_bindings(None);
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|t| t.role.as_str() == "roles/editor"));
        assert!(all.iter().all(|t| t.expires_at.is_some()));

        let only_b = policy.temporary_bindings(Some(&member("b@example.com")));
        assert_eq!(only_b.len(), 1);
        assert_eq!(only_b[0].member, member("b@example.com"));
    }

    #[test]
    fn test_remove_temporary_is_position_independent() {
        let mut policy = Policy::default();
        policy.add_binding(temp_binding("viewer", 1, &["a@example.com"]));
        policy.add_binding(Binding::new(role("owner"), vec![member("o@example.com")]));
        policy.add_binding(temp_binding("editor", 2, &["a@example.com", "b@example.com"]));
        policy.add_binding(temp_binding("viewer", 3, &["a@example.com"]));

        let matches = policy.temporary_bindings(Some(&member("a@example.com")));
        assert_eq!(matches.len(), 3);

        let removed = policy.remove_temporary(&matches);
        assert_eq!(removed, 3);

        assert_eq!(policy.bindings.len(), 2);
        assert_eq!(policy.bindings[0].role, role("owner"));
        assert_eq!(policy.bindings[1].role, role("editor"));
        assert_eq!(policy.bindings[1].members, vec![member("b@example.com")]);
    }

    #[test]
    fn test_remove_temporary_ignores_permanent_bindings() {
        let mut policy = Policy::default();
        policy.add_binding(Binding::new(role("viewer"), vec![member("a@example.com")]));
        let matches = vec![TemporaryBinding {
            role: role("viewer"),
            member: member("a@example.com"),
            id: BindingId::from_nanos(1),
            expires_at: None,
            expression: String::new(),
        }];

        assert_eq!(policy.remove_temporary(&matches), 0);
        assert_eq!(policy.bindings.len(), 1);
    }
}
