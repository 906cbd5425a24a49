//! # gta Provider
//!
//! Policy client abstraction for gta. Provides a trait-based interface over
//! the remote "get policy / set policy" API pair with an HTTP implementation
//! for Cloud Resource Manager and an in-memory implementation for tests.
//!
//! ## Key Types
//!
//! - [`PolicyClient`] - The async trait for all remote operations
//! - [`GcpPolicyClient`] - Cloud Resource Manager v1 over HTTPS
//! - [`MemoryPolicyClient`] - In-memory policies with failure injection
//! - [`TokenSource`] - Where bearer tokens come from
//!
//! ## Usage
//!
//! ```rust,no_run
//! use gta_provider::{GcpConfig, GcpPolicyClient, PolicyClient, TokenSource};
//!
//! async fn example() {
//!     let client = GcpPolicyClient::new(GcpConfig::default(), TokenSource::Gcloud).unwrap();
//!     let policy = client.get_policy("my-project").await.unwrap();
//!     println!("{} bindings", policy.bindings.len());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Wholesale replacement**: `set_policy` replaces the entire policy.
//! - **Optimistic concurrency**: the etag fetched with a policy is sent back
//!   on write; a concurrent modification surfaces as [`ProviderError::Conflict`].
//! - **No retries**: every failure is returned to the caller as-is.

pub mod error;
pub mod gcp;
pub mod memory;
pub mod token;
pub mod traits;

pub use error::{ProviderError, Result};
pub use gcp::{GcpConfig, GcpPolicyClient};
pub use memory::MemoryPolicyClient;
pub use token::TokenSource;
pub use traits::PolicyClient;
