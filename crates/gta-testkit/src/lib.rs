//! # gta Testkit
//!
//! Testing utilities for gta.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Sample policies**: Policy documents shaped like real API responses,
//!   with the number of temporary pairs each one contains
//! - **Generators**: Proptest strategies for roles, members and policies
//! - **Fixtures**: A pre-seeded in-memory policy client
//!
//! ## Sample Policies
//!
//! ```rust
//! use gta_testkit::samples::all_samples;
//!
//! for sample in all_samples() {
//!     let policy = sample.policy();
//!     assert_eq!(policy.temporary_bindings(None).len(), sample.temporary_pairs);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use gta_testkit::generators::PolicyParams;
//!
//! proptest! {
//!     #[test]
//!     fn clean_leaves_no_temporary_bindings(params: PolicyParams) {
//!         let mut policy = params.build();
//!         let found = policy.temporary_bindings(None);
//!         policy.remove_temporary(&found);
//!         prop_assert!(policy.temporary_bindings(None).is_empty());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use gta_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! fixture.seed_temporary("roles/viewer", "user:a@example.com", 1);
//! assert_eq!(fixture.policy().bindings.len(), 1);
//! ```

pub mod fixtures;
pub mod generators;
pub mod samples;

pub use fixtures::{TestFixture, HOUR, TEST_IDENTITY, TEST_PROJECT};
pub use generators::PolicyParams;
pub use samples::{all_samples, SamplePolicy};
