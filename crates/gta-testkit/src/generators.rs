//! Proptest generators for property-based testing.

use chrono::{DateTime, Utc};
use proptest::prelude::*;

use gta_core::temporary::expiry_expression;
use gta_core::{Binding, BindingId, Expr, Member, Policy, Role};

/// Generate an unqualified role name as a user would type it.
pub fn role_name() -> impl Strategy<Value = String> {
    "[a-z]{1,10}(\\.[a-z]{1,10})?".prop_map(String::from)
}

/// Generate a qualified role: predefined or project-level custom.
pub fn role() -> impl Strategy<Value = Role> {
    prop_oneof![
        role_name().prop_map(|name| Role::from_policy(format!("roles/{name}"))),
        ("[a-z][a-z0-9-]{2,10}", "[a-zA-Z]{3,12}").prop_map(|(project, name)| {
            Role::from_policy(format!("projects/{project}/roles/{name}"))
        }),
    ]
}

/// Generate an email address.
pub fn email() -> impl Strategy<Value = String> {
    "[a-z]{1,8}@[a-z]{1,8}\\.com".prop_map(String::from)
}

/// Generate a policy member of any principal type.
pub fn member() -> impl Strategy<Value = Member> {
    prop_oneof![
        email().prop_map(|e| Member::from_policy(format!("user:{e}"))),
        "[a-z]{1,8}".prop_map(|sa| Member::from_policy(format!(
            "serviceAccount:{sa}@proj.iam.gserviceaccount.com"
        ))),
        email().prop_map(|e| Member::from_policy(format!("group:{e}"))),
    ]
}

/// Generate an expiry instant between 2020 and 2040.
pub fn expiry() -> impl Strategy<Value = DateTime<Utc>> {
    (1_577_836_800i64..2_208_988_800i64)
        .prop_filter_map("timestamp in range", |secs| DateTime::from_timestamp(secs, 0))
}

fn members() -> impl Strategy<Value = Vec<Member>> {
    prop::collection::vec(member(), 1..4)
}

/// Parameters for generating a policy mixing plain, temporary and foreign
/// conditional bindings.
#[derive(Debug, Clone)]
pub struct PolicyParams {
    pub plain: Vec<(Role, Vec<Member>)>,
    pub temporary: Vec<(Role, Vec<Member>, DateTime<Utc>)>,
    pub foreign: Vec<(Role, Member)>,
}

impl PolicyParams {
    /// Number of (temporary binding, member) pairs the policy will contain.
    pub fn temporary_pairs(&self) -> usize {
        self.temporary.iter().map(|(_, m, _)| m.len()).sum()
    }

    /// Build the policy, interleaving the three kinds of binding.
    pub fn build(&self) -> Policy {
        let mut policy = Policy {
            etag: Some("generated".into()),
            ..Policy::default()
        };
        policy.enable_conditions();

        let longest = self
            .plain
            .len()
            .max(self.temporary.len())
            .max(self.foreign.len());

        for i in 0..longest {
            if let Some((role, members)) = self.plain.get(i) {
                policy.add_binding(Binding::new(role.clone(), members.clone()));
            }
            if let Some((role, members, expires_at)) = self.temporary.get(i) {
                let mut binding = Binding::new(role.clone(), members.clone());
                binding.condition = Some(Expr {
                    title: BindingId::from_nanos(1_700_000_000_000_000_000 + i as i64)
                        .as_str()
                        .to_string(),
                    description: None,
                    expression: expiry_expression(*expires_at),
                    location: None,
                });
                policy.add_binding(binding);
            }
            if let Some((role, member)) = self.foreign.get(i) {
                let mut binding = Binding::new(role.clone(), vec![member.clone()]);
                binding.condition = Some(Expr {
                    title: format!("business_hours_{i}"),
                    description: None,
                    expression: "request.time.getHours('Europe/Berlin') < 18".into(),
                    location: None,
                });
                policy.add_binding(binding);
            }
        }

        policy
    }
}

impl Arbitrary for PolicyParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            prop::collection::vec((role(), members()), 0..5),
            prop::collection::vec((role(), members(), expiry()), 0..5),
            prop::collection::vec((role(), member()), 0..3),
        )
            .prop_map(|(plain, temporary, foreign)| PolicyParams {
                plain,
                temporary,
                foreign,
            })
            .boxed()
    }
}
