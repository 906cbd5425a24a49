//! Session-local record of a successful grant.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::principal::Role;
use crate::temporary::BindingId;

/// A role this process granted, with the ID of the binding it created.
///
/// Revocation is scoped to these records, so a session never touches
/// temporary bindings created by another session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrantedRole {
    pub role: Role,
    pub id: BindingId,
    pub expires_at: DateTime<Utc>,
}

impl GrantedRole {
    pub fn new(role: Role, id: BindingId, expires_at: DateTime<Utc>) -> Self {
        Self {
            role,
            id,
            expires_at,
        }
    }
}
