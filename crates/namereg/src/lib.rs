//! # namereg
//!
//! A lease-based name registry. Names map to owner identities and metadata;
//! ownership lasts as long as the rent paid for it and lapses unless renewed.
//!
//! ## Key Concepts
//!
//! - **NameKey**: Blake3 of the normalized name. `Alice.fns` and `alice`
//!   share one key.
//! - **Lease**: `[created_at, expires_at)`. A record is live while
//!   `now < expires_at`; after that the name is free for anyone.
//! - **Grace window**: for a while after expiry the previous owner may still
//!   renew, unless someone else registered the name first.
//! - **Rent**: per-second rate by label length, times duration.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use namereg::{Registry, RegistryConfig};
//! use namereg::core::Keypair;
//! use namereg::store::SqliteStore;
//!
//! async fn example() -> namereg::Result<()> {
//!     let store = SqliteStore::open("registry.db")?;
//!     let registry = Registry::new(store, RegistryConfig::default())?;
//!
//!     let alice = Keypair::generate().owner_id();
//!     let now = 1_000;
//!
//!     let rent = registry.quote("alice.fns", 31_536_000).await?;
//!     println!("one year costs {}", rent);
//!
//!     let record = registry.register("alice.fns", 31_536_000, alice, now).await?;
//!     registry.update_bio("alice", alice, "hello", now).await?;
//!     registry.renew("alice", 31_536_000, alice, record.expires_at - 10).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `namereg::core` - Pure primitives (NameKey, DomainRecord, pricing)
//! - `namereg::store` - Storage abstraction and SQLite

pub mod config;
pub mod error;
pub mod registry;

// Re-export component crates
pub use namereg_core as core;
pub use namereg_store as store;

pub use config::RegistryConfig;
pub use error::{RegistryError, Result};
pub use registry::Registry;

// Re-export commonly used core types
pub use namereg_core::{
    Amount, Blake3Hash, DomainRecord, Keypair, Lifecycle, MetadataUpdate, NameKey, NameOrKey,
    NamePolicy, OwnerId, PriceTable, Timestamp,
};
