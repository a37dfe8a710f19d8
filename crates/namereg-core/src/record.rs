//! Domain records and the expiry state machine.
//!
//! A record is live while `now < expires_at`. Expiry is a predicate, not an
//! event: nothing deletes an expired record, it simply stops being visible
//! and can be replaced by the next registration.

use serde::{Deserialize, Serialize};

use crate::crypto::OwnerId;
use crate::error::{CoreError, Result};
use crate::types::{NameKey, Timestamp, MAX_TIMESTAMP};

/// One leased name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRecord {
    /// Primary key, derived from the normalized name.
    pub key: NameKey,

    /// The name as the registrant supplied it.
    pub name: String,

    /// Current holder.
    pub owner: OwnerId,

    /// Start of this tenancy (unix seconds).
    pub created_at: Timestamp,

    /// End of the lease (unix seconds). Only moves forward.
    pub expires_at: Timestamp,

    /// Free-form owner text.
    pub bio: Option<String>,

    /// Linked external address.
    pub address: Option<String>,
}

impl DomainRecord {
    /// Start a new tenancy: `created_at = now`, `expires_at = now + duration`.
    ///
    /// Metadata starts empty. Fails with `InvalidDuration` for a zero
    /// duration or one that would overflow the timestamp.
    pub fn new(
        key: NameKey,
        name: impl Into<String>,
        owner: OwnerId,
        now: Timestamp,
        duration_secs: u64,
    ) -> Result<Self> {
        let expires_at = lease_end(now, duration_secs)?;
        Ok(Self {
            key,
            name: name.into(),
            owner,
            created_at: now,
            expires_at,
            bio: None,
            address: None,
        })
    }

    /// Whether the lease is still running at `now`.
    pub fn is_live(&self, now: Timestamp) -> bool {
        now < self.expires_at
    }

    /// Whether the lease has lapsed at `now`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        !self.is_live(now)
    }

    /// Whether the holder may still renew at `now`: while live, and for
    /// `grace_secs` after expiry.
    pub fn is_renewable(&self, now: Timestamp, grace_secs: u64) -> bool {
        now < self.expires_at.saturating_add(grace_secs)
    }

    /// Whether `owner` holds this record at `now`.
    pub fn is_held_by(&self, owner: &OwnerId, now: Timestamp) -> bool {
        self.is_live(now) && &self.owner == owner
    }

    /// Seconds of lease left at `now` (zero once expired).
    pub fn remaining(&self, now: Timestamp) -> u64 {
        self.expires_at.saturating_sub(now)
    }

    /// The expiry after renewing for `duration_secs` at `now`, counted from
    /// the current expiry rather than from the renewal time.
    ///
    /// The result must lie after `now`: a renewal late in the grace window
    /// that would leave the name expired is rejected.
    pub fn renewed_expiry(&self, duration_secs: u64, now: Timestamp) -> Result<Timestamp> {
        let end = lease_end(self.expires_at, duration_secs)?;
        if end <= now {
            return Err(CoreError::InvalidDuration(format!(
                "renewal for {}s ends at {}, not after {}",
                duration_secs, end, now
            )));
        }
        Ok(end)
    }
}

/// `start + duration`, rejecting zero durations and ends past
/// [`MAX_TIMESTAMP`].
pub fn lease_end(start: Timestamp, duration_secs: u64) -> Result<Timestamp> {
    if duration_secs == 0 {
        return Err(CoreError::InvalidDuration(
            "duration must be greater than zero".into(),
        ));
    }
    start
        .checked_add(duration_secs)
        .filter(|end| *end <= MAX_TIMESTAMP)
        .ok_or_else(|| {
            CoreError::InvalidDuration(format!(
                "lease starting at {} for {}s ends past {}",
                start, duration_secs, MAX_TIMESTAMP
            ))
        })
}

/// A partial metadata edit. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataUpdate {
    pub bio: Option<String>,
    pub address: Option<String>,
}

impl MetadataUpdate {
    /// Update only the bio.
    pub fn bio(bio: impl Into<String>) -> Self {
        Self {
            bio: Some(bio.into()),
            address: None,
        }
    }

    /// Update only the address.
    pub fn address(address: impl Into<String>) -> Self {
        Self {
            bio: None,
            address: Some(address.into()),
        }
    }

    /// True if nothing would change.
    pub fn is_empty(&self) -> bool {
        self.bio.is_none() && self.address.is_none()
    }

    /// Apply the provided fields to `record`.
    pub fn apply_to(&self, record: &mut DomainRecord) {
        if let Some(bio) = &self.bio {
            record.bio = Some(bio.clone());
        }
        if let Some(address) = &self.address {
            record.address = Some(address.clone());
        }
    }
}

/// Lifecycle state of a key at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    /// No record has ever been stored for the key.
    Available,
    /// A live record exists.
    Registered,
    /// A record exists but has lapsed; the key can be registered again.
    Expired,
}

impl Lifecycle {
    /// Derive the state from the stored record (if any) at `now`.
    pub fn of(record: Option<&DomainRecord>, now: Timestamp) -> Self {
        match record {
            None => Lifecycle::Available,
            Some(r) if r.is_live(now) => Lifecycle::Registered,
            Some(_) => Lifecycle::Expired,
        }
    }

    /// Whether a registration would succeed in this state.
    pub fn is_available(self) -> bool {
        !matches!(self, Lifecycle::Registered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;

    fn record(now: Timestamp, duration: u64) -> DomainRecord {
        let owner = Keypair::from_seed(&[1; 32]).owner_id();
        DomainRecord::new(NameKey::derive("alice"), "alice", owner, now, duration).unwrap()
    }

    #[test]
    fn test_new_record_times() {
        let r = record(1000, 31_536_000);
        assert_eq!(r.created_at, 1000);
        assert_eq!(r.expires_at, 31_537_000);
        assert!(r.expires_at > r.created_at);
        assert!(r.bio.is_none() && r.address.is_none());
    }

    #[test]
    fn test_new_record_rejects_bad_duration() {
        let owner = Keypair::from_seed(&[1; 32]).owner_id();
        let key = NameKey::derive("alice");
        assert!(DomainRecord::new(key, "alice", owner, 10, 0).is_err());
        assert!(DomainRecord::new(key, "alice", owner, u64::MAX - 1, 2).is_err());
    }

    #[test]
    fn test_lease_end_bounded() {
        assert_eq!(lease_end(MAX_TIMESTAMP - 10, 10).unwrap(), MAX_TIMESTAMP);
        assert!(lease_end(MAX_TIMESTAMP - 10, 11).is_err());
        assert!(lease_end(0, u64::MAX / 2 + 10).is_err());
    }

    #[test]
    fn test_liveness_boundary() {
        let r = record(100, 50);
        assert!(r.is_live(149));
        assert!(r.is_expired(150));
        assert_eq!(r.remaining(120), 30);
        assert_eq!(r.remaining(500), 0);
    }

    #[test]
    fn test_renewable_in_grace() {
        let r = record(100, 50);
        assert!(r.is_renewable(150, 10));
        assert!(!r.is_renewable(160, 10));
        assert!(!r.is_renewable(150, 0));
    }

    #[test]
    fn test_renewed_expiry_counts_from_expiry() {
        let r = record(1000, 31_536_000);
        assert_eq!(r.renewed_expiry(31_536_000, 31_537_500).unwrap(), 63_073_000);
    }

    #[test]
    fn test_renewed_expiry_must_pass_now() {
        let r = record(0, 100);
        // 30s into the grace window, a 20s renewal would still be expired.
        assert!(matches!(
            r.renewed_expiry(20, 130),
            Err(CoreError::InvalidDuration(_))
        ));
        assert!(r.renewed_expiry(30, 130).is_err());
        assert_eq!(r.renewed_expiry(31, 130).unwrap(), 131);
    }

    #[test]
    fn test_metadata_partial_update() {
        let mut r = record(0, 10);
        MetadataUpdate::bio("hello").apply_to(&mut r);
        MetadataUpdate::address("0x01").apply_to(&mut r);
        MetadataUpdate::bio("again").apply_to(&mut r);
        assert_eq!(r.bio.as_deref(), Some("again"));
        assert_eq!(r.address.as_deref(), Some("0x01"));
        assert!(MetadataUpdate::default().is_empty());
    }

    #[test]
    fn test_lifecycle_of() {
        let r = record(100, 50);
        assert_eq!(Lifecycle::of(None, 0), Lifecycle::Available);
        assert_eq!(Lifecycle::of(Some(&r), 120), Lifecycle::Registered);
        assert_eq!(Lifecycle::of(Some(&r), 150), Lifecycle::Expired);
        assert!(Lifecycle::Expired.is_available());
        assert!(!Lifecycle::Registered.is_available());
    }
}
