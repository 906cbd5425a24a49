//! # gta
//!
//! Temporary, self-expiring IAM role grants for Google Cloud projects.
//!
//! ## Overview
//!
//! gta grants a member one or more roles through conditional bindings whose
//! condition bounds `request.time`, so access lapses on its own even if the
//! process dies. A running session remembers what it granted and revokes
//! exactly that on shutdown. Temporary bindings can be listed and bulk
//! removed at any time.
//!
//! ## Key Concepts
//!
//! - **Temporary binding**: a single-member conditional binding whose
//!   condition title starts with `gta_temporary_access`.
//! - **Session**: one [`BindingManager`]. Only bindings it created are
//!   revoked by [`BindingManager::revoke`].
//! - **Read-modify-write**: every mutation fetches the current policy,
//!   edits it and writes it back with the fetched etag.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use gta::{BindingManager, GrantRequest, ManagerConfig};
//! use gta::provider::MemoryPolicyClient;
//!
//! async fn example() -> gta::Result<()> {
//!     let client = MemoryPolicyClient::new()
//!         .with_identity("me@example.com")
//!         .with_project("my-project");
//!     let mut manager = BindingManager::new(client, ManagerConfig::default());
//!
//!     let request = GrantRequest::new("my-project", ["viewer"], Duration::from_secs(3600));
//!     let report = manager.grant(&request).await?;
//!     println!("granted {} role(s) to {}", report.granted.len(), report.member);
//!
//!     let member = report.member.clone();
//!     manager.revoke("my-project", &member).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `gta::core` - Policy model and temporary binding primitives
//! - `gta::provider` - The policy API abstraction and its implementations

pub mod error;
pub mod manager;
pub mod report;

pub use gta_core as core;
pub use gta_provider as provider;

pub use error::{ManagerError, Result};
pub use manager::{BindingManager, GrantRequest, ManagerConfig};
pub use report::{CleanReport, GrantReport, RevokeReport, RoleFailure};

pub use gta_core::{GrantedRole, Member, Role, TemporaryBinding};
