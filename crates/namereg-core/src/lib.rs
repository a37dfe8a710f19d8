//! # namereg core
//!
//! Pure primitives for the name registry: name keys, rent pricing, domain
//! records, and the owner index.
//!
//! This crate contains no I/O, no storage, no clocks. Every function that
//! depends on time takes `now` as an argument.
//!
//! ## Key Types
//!
//! - [`NameKey`] - Blake3 key of a normalized name
//! - [`NamePolicy`] - Normalization and validation rules
//! - [`RentPricer`] / [`PriceTable`] - Length-tiered rent pricing
//! - [`DomainRecord`] - One leased name
//! - [`Lifecycle`] - Available / Registered / Expired
//! - [`OwnerIndex`] - Owner -> assigned keys
//! - [`OwnerId`] - Ed25519 public key identifying an owner

pub mod canonical;
pub mod crypto;
pub mod error;
pub mod index;
pub mod pricing;
pub mod record;
pub mod types;
pub mod validation;

pub use canonical::{canonical_record_bytes, state_digest};
pub use crypto::{Blake3Hash, Keypair, OwnerId};
pub use error::{CoreError, NameRejection};
pub use index::OwnerIndex;
pub use pricing::{Amount, PriceTable, RentPricer, SECONDS_PER_YEAR};
pub use record::{lease_end, DomainRecord, Lifecycle, MetadataUpdate};
pub use types::{NameKey, NameOrKey, Timestamp, MAX_TIMESTAMP};
pub use validation::NamePolicy;
