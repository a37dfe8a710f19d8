//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::path::Path;

use namereg::{Registry, RegistryConfig};
use namereg_core::{DomainRecord, Keypair, OwnerId, Timestamp, SECONDS_PER_YEAR};
use namereg_store::{MemoryStore, SqliteStore};

/// One year, the default minimum lease.
pub const YEAR: u64 = SECONDS_PER_YEAR;

/// A test fixture: one owner and a registry over a memory store.
pub struct TestFixture {
    pub keypair: Keypair,
    pub registry: Registry<MemoryStore>,
}

impl TestFixture {
    /// Create a new test fixture with a random keypair.
    pub fn new() -> Self {
        Self::build(Keypair::generate(), RegistryConfig::default())
    }

    /// Create with a deterministic keypair from seed.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self::build(Keypair::from_seed(&seed), RegistryConfig::default())
    }

    /// Create with a custom configuration. The fixture's owner is made admin.
    pub fn with_config(seed: [u8; 32], config: RegistryConfig) -> Self {
        let keypair = Keypair::from_seed(&seed);
        let config = RegistryConfig {
            admin: Some(keypair.owner_id()),
            ..config
        };
        Self::build(keypair, config)
    }

    fn build(keypair: Keypair, config: RegistryConfig) -> Self {
        let registry =
            Registry::new(MemoryStore::new(), config).expect("fixture config is valid");
        Self { keypair, registry }
    }

    /// The fixture owner's identity.
    pub fn owner(&self) -> OwnerId {
        self.keypair.owner_id()
    }

    /// Register `name` for the fixture owner for one year from `now`.
    pub async fn register(&self, name: &str, now: Timestamp) -> DomainRecord {
        self.registry
            .register(name, YEAR, self.owner(), now)
            .await
            .expect("fixture registration succeeds")
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Deterministic owner identities for multi-party tests.
pub fn multi_party_owners(count: usize) -> Vec<OwnerId> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[0] = i as u8;
            seed[1] = (i >> 8) as u8;
            Keypair::from_seed(&seed).owner_id()
        })
        .collect()
}

/// A default-config registry backed by a SQLite file at `path`.
pub fn sqlite_registry(path: impl AsRef<Path>) -> Registry<SqliteStore> {
    let store = SqliteStore::open(path).expect("open sqlite store");
    Registry::new(store, RegistryConfig::default()).expect("default config is valid")
}
