//! # gta Core
//!
//! Pure primitives for gta: IAM policies, conditional bindings, principals and
//! the bookkeeping that identifies bindings created by this tool.
//!
//! This crate contains no I/O and no networking. It is pure computation over
//! policy documents as returned by the Cloud Resource Manager API.
//!
//! ## Key Types
//!
//! - [`Policy`] - A project IAM policy, fetched and replaced wholesale
//! - [`Binding`] - A role-to-members assignment with an optional [`Expr`] condition
//! - [`BindingId`] - The unique condition title of a temporary binding
//! - [`TemporaryBinding`] - One (binding, member) pair owned by this tool
//! - [`GrantedRole`] - What the current session created
//!
//! ## Temporary bindings
//!
//! A binding is temporary when its condition title starts with
//! [`TEMPORARY_TITLE_PREFIX`]. The condition expression bounds `request.time`
//! to an RFC 3339 timestamp, see [`temporary::expiry_expression`].

pub mod duration;
pub mod error;
pub mod grant;
pub mod policy;
pub mod principal;
pub mod temporary;

pub use duration::{format_ttl, parse_ttl};
pub use error::{CoreError, Result};
pub use grant::GrantedRole;
pub use policy::{Binding, Expr, MemberRemoval, Policy, CONDITIONAL_POLICY_VERSION};
pub use principal::{Member, Role, ROLE_PREFIX};
pub use temporary::{
    BindingId, BindingIdGenerator, TemporaryBinding, TemporaryCondition, TEMPORARY_TITLE_PREFIX,
};
