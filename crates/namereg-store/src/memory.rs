//! In-memory implementation of the Store trait.
//!
//! Same semantics as SQLite, no persistence. Each call holds the lock for
//! its whole read-check-write sequence, which is what makes it atomic.

use std::collections::{BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use namereg_core::{DomainRecord, MetadataUpdate, NameKey, OwnerId, OwnerIndex, Timestamp};

use crate::error::{Result, StoreError};
use crate::traits::{check_lease, InsertResult, Store};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Records indexed by key, including expired ones.
    records: HashMap<NameKey, StoredRecord>,

    /// Owner -> assigned keys.
    index: OwnerIndex,

    /// Next insertion sequence number.
    next_seq: u64,
}

struct StoredRecord {
    record: DomainRecord,
    seq: u64,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &NameKey, now: Timestamp) -> Result<Option<DomainRecord>> {
        let inner = self.read()?;
        Ok(inner
            .records
            .get(key)
            .filter(|s| s.record.is_live(now))
            .map(|s| s.record.clone()))
    }

    async fn get_any(&self, key: &NameKey) -> Result<Option<DomainRecord>> {
        let inner = self.read()?;
        Ok(inner.records.get(key).map(|s| s.record.clone()))
    }

    async fn all_live(&self, now: Timestamp) -> Result<Vec<DomainRecord>> {
        let inner = self.read()?;

        let mut live: Vec<&StoredRecord> = inner
            .records
            .values()
            .filter(|s| s.record.is_live(now))
            .collect();
        live.sort_by_key(|s| s.seq);

        Ok(live.into_iter().map(|s| s.record.clone()).collect())
    }

    async fn insert(&self, record: &DomainRecord, now: Timestamp) -> Result<InsertResult> {
        check_lease(record)?;

        let mut inner = self.write()?;

        // A live tenancy blocks; an expired one is replaced.
        let previous_owner = match inner.records.get(&record.key) {
            Some(existing) if existing.record.is_live(now) => {
                return Err(StoreError::NameTaken(record.key));
            }
            Some(existing) => Some(existing.record.owner),
            None => None,
        };

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.records.insert(
            record.key,
            StoredRecord {
                record: record.clone(),
                seq,
            },
        );
        inner
            .index
            .reassign(previous_owner.as_ref(), record.owner, record.key);

        Ok(match previous_owner {
            Some(previous_owner) => {
                tracing::debug!(
                    key = %record.key,
                    previous = %previous_owner,
                    owner = %record.owner,
                    "replaced expired record"
                );
                InsertResult::Replaced { previous_owner }
            }
            None => InsertResult::Inserted,
        })
    }

    async fn extend_expiry(
        &self,
        key: &NameKey,
        owner: &OwnerId,
        duration_secs: u64,
        now: Timestamp,
        grace_secs: u64,
    ) -> Result<DomainRecord> {
        let mut inner = self.write()?;

        let stored = inner
            .records
            .get_mut(key)
            .filter(|s| s.record.is_renewable(now, grace_secs))
            .ok_or(StoreError::NotFound(*key))?;

        if &stored.record.owner != owner {
            return Err(StoreError::Unauthorized(*key));
        }

        stored.record.expires_at = stored.record.renewed_expiry(duration_secs, now)?;
        Ok(stored.record.clone())
    }

    async fn update_metadata(
        &self,
        key: &NameKey,
        owner: &OwnerId,
        update: &MetadataUpdate,
        now: Timestamp,
    ) -> Result<DomainRecord> {
        let mut inner = self.write()?;

        let stored = inner
            .records
            .get_mut(key)
            .filter(|s| s.record.is_live(now))
            .ok_or(StoreError::NotFound(*key))?;

        if &stored.record.owner != owner {
            return Err(StoreError::Unauthorized(*key));
        }

        update.apply_to(&mut stored.record);
        Ok(stored.record.clone())
    }

    async fn domains_of(&self, owner: &OwnerId) -> Result<BTreeSet<NameKey>> {
        let inner = self.read()?;
        Ok(inner.index.keys_of(owner))
    }

    async fn live_records_of(
        &self,
        owner: &OwnerId,
        now: Timestamp,
    ) -> Result<Vec<DomainRecord>> {
        let inner = self.read()?;
        let records = &inner.records;

        let held = inner
            .index
            .effective_domains_of(owner, now, |k| records.get(k).map(|s| &s.record));

        Ok(held
            .iter()
            .filter_map(|k| records.get(k).map(|s| s.record.clone()))
            .collect())
    }
}
