//! The Registry: leases, renewals and lookups over a [`Store`].
//!
//! Every mutation ends in one atomic store call that re-checks ownership and
//! liveness, so registries sharing a store cannot overwrite each other's
//! leases. Within one registry a writer gate also orders the mutations.
//! Reads skip the gate and rely on each store call being one snapshot.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use namereg_core::{
    state_digest, Amount, Blake3Hash, DomainRecord, Lifecycle, MetadataUpdate, NameKey,
    NameOrKey, OwnerId, PriceTable, RentPricer, Timestamp,
};
use namereg_store::{InsertResult, Store, StoreExt};

use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};

/// The main Registry struct.
///
/// Time is always supplied by the caller as unix seconds; the registry never
/// reads a clock.
pub struct Registry<S: Store> {
    /// The storage backend.
    store: Arc<S>,
    /// Configuration. Admin setters replace parts of it at runtime.
    config: RwLock<RegistryConfig>,
    /// Held for the duration of every mutation.
    write_gate: Mutex<()>,
}

impl<S: Store> Registry<S> {
    /// Create a registry over `store`.
    pub fn new(store: S, config: RegistryConfig) -> Result<Self> {
        Self::with_shared_store(Arc::new(store), config)
    }

    /// Create a registry over a store that is shared with other components.
    pub fn with_shared_store(store: Arc<S>, config: RegistryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            config: RwLock::new(config),
            write_gate: Mutex::new(()),
        })
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// A snapshot of the current configuration.
    pub async fn config(&self) -> RegistryConfig {
        self.config.read().await.clone()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Query Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether `name` can be registered at `now`.
    pub async fn check_availability(&self, name: &str, now: Timestamp) -> Result<bool> {
        let key = self.compute_key(name).await?;
        Ok(self.store.is_available(&key, now).await?)
    }

    /// Rent for holding `name` for `duration_secs`. No state is touched.
    pub async fn quote(&self, name: &str, duration_secs: u64) -> Result<Amount> {
        let config = self.config.read().await;
        let label = config.name_policy.normalize(name)?;
        Ok(RentPricer::new(config.prices.clone()).price(&label, duration_secs)?)
    }

    /// Live record addressed by name or hex key.
    pub async fn lookup_by_key(
        &self,
        target: impl Into<NameOrKey>,
        now: Timestamp,
    ) -> Result<Option<DomainRecord>> {
        let key = match target.into() {
            NameOrKey::Key(key) => key,
            NameOrKey::Name(name) => self.compute_key(&name).await?,
        };
        Ok(self.store.get(&key, now).await?)
    }

    /// Live records held by `owner`, ordered by key.
    pub async fn lookup_all_for_owner(
        &self,
        owner: &OwnerId,
        now: Timestamp,
    ) -> Result<Vec<DomainRecord>> {
        Ok(self.store.live_records_of(owner, now).await?)
    }

    /// Keys `owner` holds at `now`. Lapsed and reassigned names are left out.
    pub async fn effective_domains_of(
        &self,
        owner: &OwnerId,
        now: Timestamp,
    ) -> Result<Vec<NameKey>> {
        let records = self.store.live_records_of(owner, now).await?;
        Ok(records.into_iter().map(|r| r.key).collect())
    }

    /// Every live record, in registration order.
    pub async fn lookup_all_live(&self, now: Timestamp) -> Result<Vec<DomainRecord>> {
        Ok(self.store.all_live(now).await?)
    }

    /// Lifecycle state of `name` at `now`.
    pub async fn lifecycle(&self, name: &str, now: Timestamp) -> Result<Lifecycle> {
        let key = self.compute_key(name).await?;
        Ok(self.store.lifecycle(&key, now).await?)
    }

    /// Digest of the live state at `now`, independent of backend and
    /// insertion order.
    pub async fn state_digest(&self, now: Timestamp) -> Result<Blake3Hash> {
        let records = self.store.all_live(now).await?;
        Ok(state_digest(&records)?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lease Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Register `name` for `owner` from `now` for `duration_secs`.
    ///
    /// An expired record is replaced and its metadata dropped.
    pub async fn register(
        &self,
        name: &str,
        duration_secs: u64,
        owner: OwnerId,
        now: Timestamp,
    ) -> Result<DomainRecord> {
        let _gate = self.write_gate.lock().await;
        let config = self.config.read().await;

        let label = config.name_policy.normalize(name)?;
        if duration_secs < config.min_rent_secs {
            return Err(RegistryError::InvalidDuration(format!(
                "{}s is below the minimum of {}s",
                duration_secs, config.min_rent_secs
            )));
        }
        let rent = RentPricer::new(config.prices.clone()).price(&label, duration_secs)?;
        let record = DomainRecord::new(NameKey::derive(&label), name, owner, now, duration_secs)?;

        let result = self.store.insert(&record, now).await?;

        tracing::info!(
            name = %config.name_policy.display_name(&label),
            key = %record.key,
            owner = %owner,
            expires_at = record.expires_at,
            rent = %rent,
            replaced = matches!(result, InsertResult::Replaced { .. }),
            "registered name"
        );

        Ok(record)
    }

    /// Extend the lease on `name` by `duration_secs`, counted from the
    /// current expiry.
    ///
    /// Accepted while live and during the grace window after expiry, as long
    /// as the name has not been registered by someone else. The new expiry
    /// must lie after `now`.
    pub async fn renew(
        &self,
        name: &str,
        duration_secs: u64,
        owner: OwnerId,
        now: Timestamp,
    ) -> Result<DomainRecord> {
        let _gate = self.write_gate.lock().await;
        let config = self.config.read().await;

        let label = config.name_policy.normalize(name)?;
        let key = NameKey::derive(&label);
        let rent = RentPricer::new(config.prices.clone()).price(&label, duration_secs)?;

        let record = match self
            .store
            .extend_expiry(&key, &owner, duration_secs, now, config.renewal_grace_secs)
            .await
        {
            Ok(record) => record,
            Err(err) => {
                let err = RegistryError::from(err);
                if matches!(err, RegistryError::Unauthorized(_)) {
                    tracing::warn!(key = %key, caller = %owner, "renewal by non-owner rejected");
                }
                return Err(err);
            }
        };

        tracing::info!(
            key = %key,
            owner = %owner,
            expires_at = record.expires_at,
            rent = %rent,
            "renewed name"
        );

        Ok(record)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Metadata Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Set the bio of a name `owner` holds.
    pub async fn update_bio(
        &self,
        name: &str,
        owner: OwnerId,
        bio: impl Into<String>,
        now: Timestamp,
    ) -> Result<DomainRecord> {
        self.update_metadata(name, owner, MetadataUpdate::bio(bio), now)
            .await
    }

    /// Set the linked address of a name `owner` holds.
    pub async fn update_address(
        &self,
        name: &str,
        owner: OwnerId,
        address: impl Into<String>,
        now: Timestamp,
    ) -> Result<DomainRecord> {
        self.update_metadata(name, owner, MetadataUpdate::address(address), now)
            .await
    }

    /// Apply the provided metadata fields; absent fields are left as they are.
    pub async fn update_metadata(
        &self,
        name: &str,
        owner: OwnerId,
        update: MetadataUpdate,
        now: Timestamp,
    ) -> Result<DomainRecord> {
        let key = self.compute_key(name).await?;
        let _gate = self.write_gate.lock().await;

        match self.store.update_metadata(&key, &owner, &update, now).await {
            Ok(record) => {
                tracing::info!(
                    key = %key,
                    owner = %owner,
                    bio = update.bio.is_some(),
                    address = update.address.is_some(),
                    "updated metadata"
                );
                Ok(record)
            }
            Err(err) => {
                let err = RegistryError::from(err);
                if matches!(err, RegistryError::Unauthorized(_)) {
                    tracing::warn!(key = %key, caller = %owner, "metadata update by non-owner rejected");
                }
                Err(err)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Admin Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Replace the price table. Only the configured admin may do this.
    pub async fn set_price_table(&self, caller: &OwnerId, table: PriceTable) -> Result<()> {
        let _gate = self.write_gate.lock().await;
        let mut config = self.config.write().await;
        authorize_admin(&config, caller)?;

        config.prices = table;
        tracing::info!(admin = %caller, rates = ?config.prices.rates(), "price table updated");
        Ok(())
    }

    /// Change the minimum registration length. Only the configured admin may
    /// do this.
    pub async fn set_min_rent_duration(&self, caller: &OwnerId, secs: u64) -> Result<()> {
        let _gate = self.write_gate.lock().await;
        let mut config = self.config.write().await;
        authorize_admin(&config, caller)?;

        config.min_rent_secs = secs;
        tracing::info!(admin = %caller, min_rent_secs = secs, "minimum rent duration updated");
        Ok(())
    }

    async fn compute_key(&self, name: &str) -> Result<NameKey> {
        Ok(self.config.read().await.name_policy.compute_key(name)?)
    }
}

fn authorize_admin(config: &RegistryConfig, caller: &OwnerId) -> Result<()> {
    if config.admin.as_ref() == Some(caller) {
        return Ok(());
    }
    tracing::warn!(caller = %caller, "admin operation by non-admin rejected");
    Err(RegistryError::Unauthorized(
        "caller is not the registry admin".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use namereg_core::{Keypair, SECONDS_PER_YEAR};
    use namereg_store::MemoryStore;

    const YEAR: u64 = SECONDS_PER_YEAR;
    const DEFAULT_GRACE: u64 = crate::config::DEFAULT_RENEWAL_GRACE_SECS;

    fn owner(seed: u8) -> OwnerId {
        Keypair::from_seed(&[seed; 32]).owner_id()
    }

    fn registry() -> Registry<MemoryStore> {
        Registry::new(MemoryStore::new(), RegistryConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_register_then_taken() {
        let reg = registry();
        let (a, b) = (owner(1), owner(2));

        assert!(reg.check_availability("alice", 1000).await.unwrap());
        let record = reg.register("alice", YEAR, a, 1000).await.unwrap();
        assert_eq!(record.created_at, 1000);
        assert_eq!(record.expires_at, 1000 + YEAR);
        assert!(!reg.check_availability("alice", 1001).await.unwrap());

        let err = reg.register("Alice.fns", YEAR, b, 2000).await.unwrap_err();
        assert!(matches!(err, RegistryError::NameTaken(k) if k == record.key));
    }

    #[tokio::test]
    async fn test_register_validation() {
        let reg = registry();
        let a = owner(1);

        let err = reg.register("-bad", YEAR, a, 0).await.unwrap_err();
        assert!(matches!(err, RegistryError::InvalidName { .. }));

        let err = reg.register("alice", 0, a, 0).await.unwrap_err();
        assert!(matches!(err, RegistryError::InvalidDuration(_)));

        let err = reg.register("alice", YEAR - 1, a, 0).await.unwrap_err();
        assert!(matches!(err, RegistryError::InvalidDuration(_)));

        let err = reg.register("alice", YEAR, a, u64::MAX - 5).await.unwrap_err();
        assert!(matches!(err, RegistryError::InvalidDuration(_)));

        assert!(reg.lookup_all_live(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_renew_from_current_expiry() {
        let reg = registry();
        let a = owner(1);
        reg.register("alice", YEAR, a, 1000).await.unwrap();

        // Renewing early still counts from the old expiry.
        let record = reg.renew("alice", YEAR, a, 5000).await.unwrap();
        assert_eq!(record.expires_at, 1000 + 2 * YEAR);
    }

    #[tokio::test]
    async fn test_renew_rejections() {
        let reg = registry();
        let (a, b) = (owner(1), owner(2));

        let err = reg.renew("alice", YEAR, a, 0).await.unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));

        reg.register("alice", YEAR, a, 0).await.unwrap();
        let err = reg.renew("alice", YEAR, b, 10).await.unwrap_err();
        assert!(matches!(err, RegistryError::Unauthorized(_)));

        let err = reg.renew("alice", 0, a, 10).await.unwrap_err();
        assert!(matches!(err, RegistryError::InvalidDuration(_)));

        // Past the grace window.
        let late = YEAR + DEFAULT_GRACE;
        let err = reg.renew("alice", YEAR, a, late).await.unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));

        let record = reg.lookup_by_key("alice", 10).await.unwrap().unwrap();
        assert_eq!(record.expires_at, YEAR);
    }

    #[tokio::test]
    async fn test_late_grace_renewal_must_revive() {
        let reg = registry();
        let a = owner(1);
        let record = reg.register("alice", YEAR, a, 0).await.unwrap();
        let now = record.expires_at + 30 * 86_400;

        let err = reg.renew("alice", 60, a, now).await.unwrap_err();
        assert!(matches!(err, RegistryError::InvalidDuration(_)));
        assert_eq!(reg.store().get_any(&record.key).await.unwrap(), Some(record.clone()));
        assert!(reg.check_availability("alice", now).await.unwrap());

        let renewed = reg.renew("alice", YEAR, a, now).await.unwrap();
        assert_eq!(renewed.expires_at, 2 * YEAR);
        assert_eq!(reg.lookup_by_key("alice", now).await.unwrap(), Some(renewed));
    }

    #[tokio::test]
    async fn test_renewal_across_shared_store() {
        let store = Arc::new(MemoryStore::new());
        let first = Registry::with_shared_store(store.clone(), RegistryConfig::default()).unwrap();
        let second = Registry::with_shared_store(store, RegistryConfig::default()).unwrap();
        let (a, b) = (owner(1), owner(2));

        first.register("alice", YEAR, a, 0).await.unwrap();
        let taken = second.register("alice", YEAR, b, YEAR).await.unwrap();

        // Still inside the old owner's grace window, but the name moved on.
        let err = first.renew("alice", YEAR, a, YEAR + 10).await.unwrap_err();
        assert!(matches!(err, RegistryError::Unauthorized(_)));
        let current = first.lookup_by_key("alice", YEAR + 10).await.unwrap().unwrap();
        assert_eq!(current, taken);
    }

    #[tokio::test]
    async fn test_metadata_owner_only() {
        let reg = registry();
        let (a, b) = (owner(1), owner(2));
        reg.register("alice", YEAR, a, 0).await.unwrap();

        let err = reg.update_bio("alice", b, "hijack", 10).await.unwrap_err();
        assert!(matches!(err, RegistryError::Unauthorized(_)));

        reg.update_bio("alice", a, "hello", 10).await.unwrap();
        let record = reg.update_address("alice", a, "0xabc", 11).await.unwrap();
        assert_eq!(record.bio.as_deref(), Some("hello"));
        assert_eq!(record.address.as_deref(), Some("0xabc"));
    }

    #[tokio::test]
    async fn test_address_update_owner_only() {
        let reg = registry();
        let (a, b) = (owner(1), owner(2));
        reg.register("alice", YEAR, a, 0).await.unwrap();
        reg.update_address("alice", a, "0xabc", 5).await.unwrap();

        let err = reg.update_address("alice", b, "0xevil", 10).await.unwrap_err();
        assert!(matches!(err, RegistryError::Unauthorized(_)));

        let record = reg.lookup_by_key("alice", 10).await.unwrap().unwrap();
        assert_eq!(record.address.as_deref(), Some("0xabc"));
        assert_eq!(record.owner, a);
    }

    #[tokio::test]
    async fn test_quote_matches_table() {
        let reg = registry();
        assert_eq!(reg.quote("a", 10).await.unwrap(), Amount(10_000_000));
        assert_eq!(reg.quote("alice.fns", 2).await.unwrap(), Amount(100_000));
        assert!(matches!(
            reg.quote("alice", 0).await.unwrap_err(),
            RegistryError::InvalidDuration(_)
        ));
    }

    #[tokio::test]
    async fn test_lookup_by_hex_key() {
        let reg = registry();
        let record = reg.register("alice", YEAR, owner(1), 0).await.unwrap();

        let by_hex = reg
            .lookup_by_key(record.key.to_hex().as_str(), 5)
            .await
            .unwrap();
        assert_eq!(by_hex, Some(record.clone()));
        assert_eq!(reg.lookup_by_key(record.key, 5).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_admin_setters() {
        let admin = owner(7);
        let config = RegistryConfig {
            admin: Some(admin),
            ..RegistryConfig::default()
        };
        let reg = Registry::new(MemoryStore::new(), config).unwrap();

        let err = reg.set_min_rent_duration(&owner(1), 1).await.unwrap_err();
        assert!(matches!(err, RegistryError::Unauthorized(_)));

        reg.set_min_rent_duration(&admin, 60).await.unwrap();
        reg.set_price_table(&admin, PriceTable::new(vec![5]).unwrap())
            .await
            .unwrap();

        assert_eq!(reg.quote("alice", 60).await.unwrap(), Amount(300));
        reg.register("alice", 60, owner(1), 0).await.unwrap();
    }

    #[tokio::test]
    async fn test_admin_setters_without_admin() {
        let reg = registry();
        let err = reg
            .set_price_table(&owner(1), PriceTable::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Unauthorized(_)));
    }
}
