//! Roles and members.
//!
//! Both are newtypes over the exact strings the IAM API stores, so a value
//! that went through [`Role::normalize`] or [`Member::from_identity`] can be
//! compared directly against policy contents.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// Standard prefix for predefined IAM roles.
pub const ROLE_PREFIX: &str = "roles/";

/// Prefixes that mark a role name as already fully qualified.
const QUALIFIED_ROLE_PREFIXES: &[&str] = &[ROLE_PREFIX, "projects/", "organizations/"];

/// Principal type prefixes understood by the IAM API.
const MEMBER_TYPE_PREFIXES: &[&str] = &["user:", "serviceAccount:", "group:", "domain:"];

const SERVICE_ACCOUNT_SUFFIX: &str = ".gserviceaccount.com";

/// A fully qualified IAM role name, e.g. `roles/viewer`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    /// Normalize a role name by ensuring the standard `roles/` prefix.
    ///
    /// Custom roles (`projects/.../roles/...`, `organizations/.../roles/...`)
    /// are already qualified and are returned unchanged.
    pub fn normalize(name: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() || name == ROLE_PREFIX {
            return Err(CoreError::EmptyRole);
        }

        if QUALIFIED_ROLE_PREFIXES.iter().any(|p| name.starts_with(p)) {
            Ok(Self(name.to_string()))
        } else {
            Ok(Self(format!("{ROLE_PREFIX}{name}")))
        }
    }

    /// Wrap a role string exactly as stored in a policy.
    pub fn from_policy(role: impl Into<String>) -> Self {
        Self(role.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Role({})", self.0)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A policy member string, e.g. `user:alice@example.com`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Member(String);

impl Member {
    /// Format an identity as a policy member.
    ///
    /// - identities that already carry a principal type prefix are kept;
    /// - `*.gserviceaccount.com` emails become `serviceAccount:<email>`;
    /// - anything else becomes `user:<email>`.
    pub fn from_identity(identity: &str) -> Result<Self> {
        let identity = identity.trim();
        if identity.is_empty() {
            return Err(CoreError::EmptyMember);
        }

        if MEMBER_TYPE_PREFIXES.iter().any(|p| identity.starts_with(p)) {
            return Ok(Self(identity.to_string()));
        }

        if identity.ends_with(SERVICE_ACCOUNT_SUFFIX) {
            Ok(Self(format!("serviceAccount:{identity}")))
        } else {
            Ok(Self(format!("user:{identity}")))
        }
    }

    /// Wrap a member string exactly as stored in a policy.
    pub fn from_policy(member: impl Into<String>) -> Self {
        Self(member.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Member({})", self.0)
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Member {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
