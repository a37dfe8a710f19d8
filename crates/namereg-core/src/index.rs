//! Owner index: owner identity -> keys assigned to that owner.
//!
//! The index records assignments, not liveness. A key stays in its owner's
//! set after the lease lapses and leaves it only when the key is registered
//! again. Readers that need "what does this owner hold now" go through
//! [`OwnerIndex::effective_domains_of`], which re-derives liveness from the
//! records at read time.

use std::collections::{BTreeSet, HashMap};

use crate::crypto::OwnerId;
use crate::record::DomainRecord;
use crate::types::{NameKey, Timestamp};

/// Secondary index from owner to assigned keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnerIndex {
    by_owner: HashMap<OwnerId, BTreeSet<NameKey>>,
}

impl OwnerIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `key` now belongs to `owner`.
    pub fn assign(&mut self, owner: OwnerId, key: NameKey) {
        self.by_owner.entry(owner).or_default().insert(key);
    }

    /// Remove `key` from `owner`'s set. Empty sets are dropped.
    ///
    /// Returns whether the key was present.
    pub fn release(&mut self, owner: &OwnerId, key: &NameKey) -> bool {
        let Some(keys) = self.by_owner.get_mut(owner) else {
            return false;
        };
        let removed = keys.remove(key);
        if keys.is_empty() {
            self.by_owner.remove(owner);
        }
        removed
    }

    /// Move `key` from `previous` (if any) to `owner` in one step.
    pub fn reassign(&mut self, previous: Option<&OwnerId>, owner: OwnerId, key: NameKey) {
        if let Some(prev) = previous {
            self.release(prev, &key);
        }
        self.assign(owner, key);
    }

    /// All keys assigned to `owner`, live or not.
    pub fn keys_of(&self, owner: &OwnerId) -> BTreeSet<NameKey> {
        self.by_owner.get(owner).cloned().unwrap_or_default()
    }

    /// Keys `owner` actually holds at `now`.
    ///
    /// `lookup` returns the stored record for a key regardless of expiry;
    /// entries whose record is missing, expired, or owned by someone else
    /// are filtered out.
    pub fn effective_domains_of<'a, F>(
        &self,
        owner: &OwnerId,
        now: Timestamp,
        lookup: F,
    ) -> Vec<NameKey>
    where
        F: Fn(&NameKey) -> Option<&'a DomainRecord>,
    {
        let Some(keys) = self.by_owner.get(owner) else {
            return Vec::new();
        };
        keys.iter()
            .filter(|key| lookup(key).is_some_and(|r| r.is_held_by(owner, now)))
            .copied()
            .collect()
    }

    /// Number of owners with at least one assignment.
    pub fn owner_count(&self) -> usize {
        self.by_owner.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;

    fn owner(seed: u8) -> OwnerId {
        Keypair::from_seed(&[seed; 32]).owner_id()
    }

    #[test]
    fn test_assign_release() {
        let mut index = OwnerIndex::new();
        let a = owner(1);
        let key = NameKey::derive("alice");

        index.assign(a, key);
        assert!(index.keys_of(&a).contains(&key));

        assert!(index.release(&a, &key));
        assert!(!index.release(&a, &key));
        assert!(index.keys_of(&a).is_empty());
        assert_eq!(index.owner_count(), 0);
    }

    #[test]
    fn test_reassign_moves_key() {
        let mut index = OwnerIndex::new();
        let (a, b) = (owner(1), owner(2));
        let key = NameKey::derive("alice");

        index.assign(a, key);
        index.reassign(Some(&a), b, key);

        assert!(index.keys_of(&a).is_empty());
        assert_eq!(index.keys_of(&b).into_iter().collect::<Vec<_>>(), vec![key]);
    }

    #[test]
    fn test_effective_domains_filters_dead_entries() {
        let mut index = OwnerIndex::new();
        let (a, b) = (owner(1), owner(2));

        let live = DomainRecord::new(NameKey::derive("live"), "live", a, 0, 100).unwrap();
        let lapsed = DomainRecord::new(NameKey::derive("lapsed"), "lapsed", a, 0, 10).unwrap();
        let stolen = DomainRecord::new(NameKey::derive("moved"), "moved", b, 0, 100).unwrap();
        let records = [live.clone(), lapsed.clone(), stolen.clone()];

        index.assign(a, live.key);
        index.assign(a, lapsed.key);
        // Stale entry: index says `a` but the record belongs to `b`.
        index.assign(a, stolen.key);
        index.assign(a, NameKey::derive("ghost"));

        let held = index.effective_domains_of(&a, 50, |k| records.iter().find(|r| &r.key == k));
        assert_eq!(held, vec![live.key]);
    }
}
