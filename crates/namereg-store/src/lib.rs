//! # namereg store
//!
//! Storage abstraction for domain records. Provides a trait-based interface
//! with SQLite and in-memory implementations.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`InsertResult`] - Whether an insert created or replaced a record
//!
//! ## Usage
//!
//! ```rust,no_run
//! use namereg_core::{DomainRecord, Keypair, NameKey};
//! use namereg_store::{SqliteStore, Store};
//!
//! async fn example() -> namereg_store::Result<()> {
//!     let store = SqliteStore::open("registry.db")?;
//!
//!     let owner = Keypair::generate().owner_id();
//!     let key = NameKey::derive("alice");
//!     let record = DomainRecord::new(key, "alice", owner, 1_000, 31_536_000)?;
//!
//!     store.insert(&record, 1_000).await?;
//!     assert!(!store.is_available(&key, 2_000).await?);
//!     Ok(())
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Lazy expiry**: nothing is deleted when a lease ends; reads filter by
//!   `now` and the next registration overwrites the stale row.
//! - **Owner index**: tracks assignments and is cross-checked against the
//!   records when answering "what does this owner hold".

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{InsertResult, Store, StoreExt};
