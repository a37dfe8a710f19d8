//! Store trait: the abstract interface for domain record persistence.
//!
//! This trait allows the registry to be storage-agnostic. Implementations
//! include SQLite (durable) and in-memory (for tests).

use std::collections::BTreeSet;

use async_trait::async_trait;
use namereg_core::{
    DomainRecord, Lifecycle, MetadataUpdate, NameKey, OwnerId, Timestamp, MAX_TIMESTAMP,
};

use crate::error::{Result, StoreError};

/// Result of inserting a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertResult {
    /// No record existed for the key.
    Inserted,
    /// An expired record was replaced; the key moved out of the previous
    /// owner's index entry.
    Replaced {
        /// Owner of the replaced tenancy.
        previous_owner: OwnerId,
    },
}

/// The Store trait: async interface for domain record persistence.
///
/// # Design Notes
///
/// - **Atomic calls**: every method runs under one lock scope or one SQL
///   transaction. A failed call leaves no trace; concurrent readers never
///   observe half of a write.
/// - **Lazy expiry**: expired records stay stored until replaced. Every read
///   applies the `now < expires_at` predicate.
/// - **Owner index**: maintained only by [`Store::insert`]. There is no
///   method to edit it directly.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Record Reads
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the live record for `key` at `now`. Expired records read as `None`.
    async fn get(&self, key: &NameKey, now: Timestamp) -> Result<Option<DomainRecord>>;

    /// Get the stored record for `key`, expired or not.
    async fn get_any(&self, key: &NameKey) -> Result<Option<DomainRecord>>;

    /// True iff no live record exists for `key` at `now`.
    async fn is_available(&self, key: &NameKey, now: Timestamp) -> Result<bool> {
        Ok(self.get(key, now).await?.is_none())
    }

    /// All live records at `now`, in insertion order.
    ///
    /// Replacing an expired record counts as a fresh insertion.
    async fn all_live(&self, now: Timestamp) -> Result<Vec<DomainRecord>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Record Writes
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert a new tenancy.
    ///
    /// # Returns
    /// - `Inserted` if the key was never stored.
    /// - `Replaced` if an expired record was overwritten.
    ///
    /// # Errors
    /// - [`StoreError::NameTaken`](crate::StoreError::NameTaken) if a live
    ///   record holds the key.
    async fn insert(&self, record: &DomainRecord, now: Timestamp) -> Result<InsertResult>;

    /// Extend the lease on `key` by `duration_secs`, counted from the
    /// current expiry, on behalf of `owner`.
    ///
    /// The record must be renewable: `now < expires_at + grace_secs`. With a
    /// zero grace this is plain liveness. The ownership check and the write
    /// happen in the same lock scope or transaction.
    ///
    /// # Errors
    /// - `NotFound` if no renewable record exists.
    /// - `Unauthorized` if `owner` does not hold the record.
    /// - `Core` if the duration is zero, the new expiry is out of range, or
    ///   it would not lie after `now`.
    async fn extend_expiry(
        &self,
        key: &NameKey,
        owner: &OwnerId,
        duration_secs: u64,
        now: Timestamp,
        grace_secs: u64,
    ) -> Result<DomainRecord>;

    /// Apply a partial metadata edit on behalf of `owner`.
    ///
    /// # Errors
    /// - `NotFound` if no live record exists.
    /// - `Unauthorized` if `owner` does not hold the record.
    async fn update_metadata(
        &self,
        key: &NameKey,
        owner: &OwnerId,
        update: &MetadataUpdate,
        now: Timestamp,
    ) -> Result<DomainRecord>;

    // ─────────────────────────────────────────────────────────────────────────
    // Owner Index
    // ─────────────────────────────────────────────────────────────────────────

    /// Keys assigned to `owner`, including lapsed ones not yet re-registered.
    async fn domains_of(&self, owner: &OwnerId) -> Result<BTreeSet<NameKey>>;

    /// Live records held by `owner` at `now`, ordered by key.
    ///
    /// Index entries are cross-checked against the records in the same
    /// snapshot; stale entries are skipped.
    async fn live_records_of(&self, owner: &OwnerId, now: Timestamp)
        -> Result<Vec<DomainRecord>>;
}

/// Extension trait for common store patterns.
pub trait StoreExt: Store {
    /// Lifecycle state of `key` at `now`.
    fn lifecycle(
        &self,
        key: &NameKey,
        now: Timestamp,
    ) -> impl std::future::Future<Output = Result<Lifecycle>> + Send;
}

impl<S: Store + ?Sized> StoreExt for S {
    async fn lifecycle(&self, key: &NameKey, now: Timestamp) -> Result<Lifecycle> {
        let record = self.get_any(key).await?;
        Ok(Lifecycle::of(record.as_ref(), now))
    }
}

/// Reject records no backend may hold: a lease that ends at or before its
/// start, or one that ends past [`MAX_TIMESTAMP`].
pub(crate) fn check_lease(record: &DomainRecord) -> Result<()> {
    if record.expires_at <= record.created_at || record.expires_at > MAX_TIMESTAMP {
        return Err(StoreError::InvalidData(format!(
            "record {} has an invalid lease [{}, {})",
            record.key, record.created_at, record.expires_at
        )));
    }
    Ok(())
}
