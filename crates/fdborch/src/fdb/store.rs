//! Entry store: ordered cache of the entries believed to be programmed in hardware.

use super::types::{FdbDomain, FdbEntry, FdbKey, UpsertOutcome};
use std::collections::BTreeMap;
use std::ops::Bound;

/// Keyed index of [`FdbEntry`] ordered by (domain, MAC).
///
/// Bridge-port MAC counts are not maintained here; callers adjust them from
/// the returned [`UpsertOutcome`] or removed entry.
#[derive(Debug, Default)]
pub struct EntryStore {
    entries: BTreeMap<FdbKey, FdbEntry>,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup(&self, key: &FdbKey) -> Option<&FdbEntry> {
        self.entries.get(key)
    }

    /// Inserts or overwrites `key`.
    ///
    /// Identical forwarding state is a no-op reported as `AlreadyExists`,
    /// which swallows duplicate hardware learns.
    pub fn upsert(&mut self, key: FdbKey, entry: FdbEntry) -> UpsertOutcome {
        match self.entries.get_mut(&key) {
            None => {
                self.entries.insert(key, entry);
                UpsertOutcome::Inserted
            }
            Some(existing) if existing.same_forwarding(&entry) => UpsertOutcome::AlreadyExists,
            Some(existing) => {
                let old_port = existing.bridge_port;
                *existing = entry;
                if old_port == existing.bridge_port {
                    UpsertOutcome::UpdatedSamePort
                } else {
                    UpsertOutcome::Moved { old_port }
                }
            }
        }
    }

    /// Unconditionally stores `entry`, returning the previous value.
    pub fn replace(&mut self, key: FdbKey, entry: FdbEntry) -> Option<FdbEntry> {
        self.entries.insert(key, entry)
    }

    pub fn remove(&mut self, key: &FdbKey) -> Option<FdbEntry> {
        self.entries.remove(key)
    }

    /// Entries with a key strictly greater than `after`, or all entries for `None`.
    ///
    /// The iterator borrows the store; to mutate while walking, take one
    /// key at a time and restart from it.
    pub fn iter_from(
        &self,
        after: Option<&FdbKey>,
    ) -> impl Iterator<Item = (&FdbKey, &FdbEntry)> + '_ {
        let lower = match after {
            Some(key) => Bound::Excluded(*key),
            None => Bound::Unbounded,
        };
        self.entries.range((lower, Bound::Unbounded))
    }

    /// Entries of one domain, in MAC order, starting after `after` if given.
    pub fn iter_domain(
        &self,
        domain: FdbDomain,
        after: Option<&FdbKey>,
    ) -> impl Iterator<Item = (&FdbKey, &FdbEntry)> + '_ {
        let lower = match after {
            Some(key) => Bound::Excluded(*key),
            None => Bound::Included(FdbKey::domain_start(domain)),
        };
        self.entries
            .range((lower, Bound::Unbounded))
            .take_while(move |(k, _)| k.domain == domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fdb::types::{FdbEntryType, PacketAction};
    use pretty_assertions::assert_eq;
    use sonic_sai::BridgePortOid;
    use sonic_types::{MacAddress, VlanId};

    fn key(vlan: u16, last: u8) -> FdbKey {
        FdbKey::vlan(
            VlanId::new(vlan).unwrap(),
            MacAddress::new([0, 0, 0, 0, 0, last]),
        )
    }

    fn entry(bp: u32) -> FdbEntry {
        FdbEntry::new(BridgePortOid::from_index(bp), FdbEntryType::Dynamic)
    }

    #[test]
    fn test_upsert_outcomes() {
        let mut store = EntryStore::new();
        assert_eq!(store.upsert(key(10, 1), entry(1)), UpsertOutcome::Inserted);
        assert_eq!(store.upsert(key(10, 1), entry(1)), UpsertOutcome::AlreadyExists);

        let mut dropped = entry(1);
        dropped.action = PacketAction::Drop;
        assert_eq!(store.upsert(key(10, 1), dropped), UpsertOutcome::UpdatedSamePort);

        assert_eq!(
            store.upsert(key(10, 1), entry(2)),
            UpsertOutcome::Moved {
                old_port: BridgePortOid::from_index(1)
            }
        );
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.lookup(&key(10, 1)).map(|e| e.bridge_port),
            Some(BridgePortOid::from_index(2))
        );
    }

    #[test]
    fn test_already_exists_does_not_touch_metadata() {
        let mut store = EntryStore::new();
        store.upsert(key(10, 1), entry(1));
        let mut tagged = entry(1);
        tagged.metadata = 9;
        assert_eq!(store.upsert(key(10, 1), tagged), UpsertOutcome::AlreadyExists);
        assert_eq!(store.lookup(&key(10, 1)).map(|e| e.metadata), Some(0));
    }

    #[test]
    fn test_remove() {
        let mut store = EntryStore::new();
        store.upsert(key(10, 1), entry(1));
        assert_eq!(store.remove(&key(10, 1)), Some(entry(1)));
        assert_eq!(store.remove(&key(10, 1)), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_iter_from_is_strictly_after() {
        let mut store = EntryStore::new();
        for k in [key(20, 1), key(10, 2), key(10, 1)] {
            store.upsert(k, entry(1));
        }
        let all: Vec<FdbKey> = store.iter_from(None).map(|(k, _)| *k).collect();
        assert_eq!(all, vec![key(10, 1), key(10, 2), key(20, 1)]);

        let rest: Vec<FdbKey> = store.iter_from(Some(&key(10, 1))).map(|(k, _)| *k).collect();
        assert_eq!(rest, vec![key(10, 2), key(20, 1)]);
    }

    #[test]
    fn test_iter_domain_stops_at_domain_boundary() {
        let mut store = EntryStore::new();
        for k in [key(10, 1), key(20, 1), key(20, 2), key(30, 1)] {
            store.upsert(k, entry(1));
        }
        let vlan20 = key(20, 0).domain;
        let keys: Vec<FdbKey> = store.iter_domain(vlan20, None).map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![key(20, 1), key(20, 2)]);

        let after: Vec<FdbKey> = store
            .iter_domain(vlan20, Some(&key(20, 1)))
            .map(|(k, _)| *k)
            .collect();
        assert_eq!(after, vec![key(20, 2)]);
    }
}
