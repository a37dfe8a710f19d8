//! # namereg testkit
//!
//! Testing utilities for namereg.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Name vectors**: Inputs with their expected normalization, so every
//!   client derives the same keys
//! - **Generators**: Proptest strategies for names, owners and durations
//! - **Fixtures**: Helper structs for setting up registries
//!
//! ## Name Vectors
//!
//! ```rust
//! use namereg_testkit::vectors::{all_vectors, verify_vector};
//!
//! for vector in all_vectors() {
//!     verify_vector(&vector).unwrap();
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use namereg_testkit::generators::name_spelling;
//! use namereg_core::NamePolicy;
//!
//! proptest! {
//!     #[test]
//!     fn key_ignores_spelling((spelling, label) in name_spelling()) {
//!         let policy = NamePolicy::default();
//!         prop_assert_eq!(policy.compute_key(&spelling).unwrap(), policy.compute_key(&label).unwrap());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use namereg_testkit::fixtures::TestFixture;
//!
//! async fn example() {
//!     let fixture = TestFixture::new();
//!     let record = fixture.register("alice", 1_000).await;
//!     assert_eq!(record.owner, fixture.owner());
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{multi_party_owners, sqlite_registry, TestFixture, YEAR};
pub use generators::RegistrationParams;
pub use vectors::{all_vectors, verify_all_vectors, verify_vector, vectors_json, NameVector};
