//! Temporary bindings: identification, condition construction and parsing.
//!
//! A temporary binding is a conditional binding whose condition title starts
//! with [`TEMPORARY_TITLE_PREFIX`] followed by `_<nanosecond timestamp>`. The
//! title doubles as the binding's identity, so it must be unique per grant.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::{CoreError, Result};
use crate::policy::Expr;
use crate::principal::{Member, Role};

/// Marker carried by every condition title this tool creates.
pub const TEMPORARY_TITLE_PREFIX: &str = "gta_temporary_access";

const EXPRESSION_HEAD: &str = "request.time < timestamp('";
const EXPRESSION_TAIL: &str = "')";

/// The condition title identifying one temporary binding.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BindingId(String);

impl BindingId {
    /// Build the title for a grant created at `nanos` since the Unix epoch.
    pub fn from_nanos(nanos: i64) -> Self {
        Self(format!("{TEMPORARY_TITLE_PREFIX}_{nanos}"))
    }

    /// Wrap a condition title exactly as stored in a policy.
    pub fn from_title(title: impl Into<String>) -> Self {
        Self(title.into())
    }

    /// Whether a condition title carries the temporary marker.
    pub fn is_temporary_title(title: &str) -> bool {
        title.starts_with(TEMPORARY_TITLE_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BindingId({})", self.0)
    }
}

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Produces strictly increasing binding IDs within one process.
///
/// Two grants inside the same clock tick (or a clock that steps backwards)
/// still receive distinct titles.
#[derive(Debug, Default)]
pub struct BindingIdGenerator {
    last_nanos: Option<i64>,
}

impl BindingIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the ID for a grant created at `now`.
    pub fn next_id(&mut self, now: DateTime<Utc>) -> BindingId {
        // timestamp_nanos_opt only fails past year 2262.
        let mut nanos = now.timestamp_nanos_opt().unwrap_or(i64::MAX);
        if let Some(last) = self.last_nanos {
            if nanos <= last {
                nanos = last.saturating_add(1);
            }
        }
        self.last_nanos = Some(nanos);
        BindingId::from_nanos(nanos)
    }
}

/// The time-bound condition attached to a temporary binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporaryCondition {
    pub id: BindingId,
    pub granted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TemporaryCondition {
    /// Condition for a grant created at `now` lasting `ttl`.
    pub fn new(id: BindingId, now: DateTime<Utc>, ttl: Duration) -> Result<Self> {
        let delta = chrono::Duration::from_std(ttl).map_err(|_| CoreError::ExpiryOutOfRange(ttl))?;
        let expires_at = now
            .checked_add_signed(delta)
            .ok_or(CoreError::ExpiryOutOfRange(ttl))?;

        Ok(Self {
            id,
            granted_at: now,
            expires_at,
        })
    }

    /// Render as the IAM condition expression object.
    pub fn to_expr(&self) -> Expr {
        Expr {
            title: self.id.as_str().to_string(),
            description: Some(format!(
                "Temporary access granted by gta at {}",
                rfc3339(self.granted_at)
            )),
            expression: expiry_expression(self.expires_at),
            location: None,
        }
    }
}

/// `request.time < timestamp('<RFC 3339>')` for the given instant.
pub fn expiry_expression(expires_at: DateTime<Utc>) -> String {
    format!("{EXPRESSION_HEAD}{}{EXPRESSION_TAIL}", rfc3339(expires_at))
}

/// The raw timestamp text inside an expiry expression.
pub fn expiry_text(expression: &str) -> &str {
    let trimmed = expression.trim();
    let inner = trimmed.strip_prefix(EXPRESSION_HEAD).unwrap_or(trimmed);
    inner.strip_suffix(EXPRESSION_TAIL).unwrap_or(inner)
}

/// Parse the expiry instant back out of an expiry expression.
pub fn parse_expiry(expression: &str) -> Result<DateTime<Utc>> {
    let trimmed = expression.trim();
    let inner = trimmed
        .strip_prefix(EXPRESSION_HEAD)
        .and_then(|s| s.strip_suffix(EXPRESSION_TAIL))
        .ok_or_else(|| CoreError::MalformedExpression(expression.to_string()))?;

    DateTime::parse_from_rfc3339(inner)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CoreError::MalformedExpression(format!("{expression}: {e}")))
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// One member of one temporary binding, as reported by list and clean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemporaryBinding {
    pub role: Role,
    pub member: Member,
    pub id: BindingId,
    /// Parsed expiry, `None` when the expression is not in the expected form.
    pub expires_at: Option<DateTime<Utc>>,
    pub expression: String,
}

impl TemporaryBinding {
    /// Expiry for display: RFC 3339 when parsed, the raw text otherwise.
    pub fn expires_display(&self) -> String {
        match self.expires_at {
            Some(at) => rfc3339(at),
            None => expiry_text(&self.expression).to_string(),
        }
    }

    /// Whether the binding has already lapsed at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}

impl fmt::Display for TemporaryBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Role={}, Member={}, Expires={}, ID={}",
            self.role,
            self.member,
            self.expires_display(),
            self.id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_binding_id_format() {
        let id = BindingId::from_nanos(1_700_000_000_123_456_789);
        assert_eq!(id.as_str(), "gta_temporary_access_1700000000123456789");
        assert!(BindingId::is_temporary_title(id.as_str()));
        assert!(!BindingId::is_temporary_title("some other condition"));
    }

    #[test]
    fn test_generator_same_instant_is_unique() {
        let mut gen = BindingIdGenerator::new();
        let now = at(1_700_000_000);
        let a = gen.next_id(now);
        let b = gen.next_id(now);
        let c = gen.next_id(at(1_600_000_000));
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert!(a < b && b < c);
    }

    #[test]
    fn test_condition_expression() {
        let cond = TemporaryCondition::new(
            BindingId::from_nanos(1),
            at(1_760_616_000),
            Duration::from_secs(3600),
        )
        .unwrap();
        let expr = cond.to_expr();

        assert_eq!(
            expr.expression,
            "request.time < timestamp('2025-10-16T13:00:00Z')"
        );
        assert_eq!(
            expr.description.as_deref(),
            Some("Temporary access granted by gta at 2025-10-16T12:00:00Z")
        );
        assert_eq!(expr.title, "gta_temporary_access_1");
    }

    #[test]
    fn test_parse_expiry_roundtrip() {
        let expires = at(1_760_619_600);
        let parsed = parse_expiry(&expiry_expression(expires)).unwrap();
        assert_eq!(parsed, expires);
    }

    #[test]
    fn test_parse_expiry_rejects_other_expressions() {
        assert!(parse_expiry("resource.name.startsWith('x')").is_err());
        assert!(parse_expiry("request.time < timestamp('not a time')").is_err());
        assert_eq!(expiry_text("resource.name == 'x'"), "resource.name == 'x'");
    }

    #[test]
    fn test_expired() {
        let binding = TemporaryBinding {
            role: Role::from_policy("roles/viewer"),
            member: Member::from_policy("user:a@example.com"),
            id: BindingId::from_nanos(1),
            expires_at: Some(at(100)),
            expression: expiry_expression(at(100)),
        };
        assert!(!binding.is_expired(at(99)));
        assert!(binding.is_expired(at(100)));
        assert_eq!(binding.expires_display(), "1970-01-01T00:01:40Z");
    }

    #[test]
    fn test_display_names_every_field() {
        let binding = TemporaryBinding {
            role: Role::from_policy("roles/viewer"),
            member: Member::from_policy("user:a@example.com"),
            id: BindingId::from_nanos(7),
            expires_at: None,
            expression: "request.time < timestamp('soon')".to_string(),
        };
        assert_eq!(
            binding.to_string(),
            "Role=roles/viewer, Member=user:a@example.com, Expires=soon, ID=gta_temporary_access_7"
        );
    }

    proptest! {
        #[test]
        fn test_generator_never_repeats(offsets in prop::collection::vec(-5i64..5, 1..64)) {
            let mut gen = BindingIdGenerator::new();
            let mut seen = HashSet::new();
            for off in offsets {
                let id = gen.next_id(at(1_700_000_000 + off));
                prop_assert!(seen.insert(id));
            }
        }
    }
}
