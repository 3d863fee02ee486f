//! State guarded by the fdb lock: the entry store, the change tracker and
//! the counters, plus the mutations that keep them and the bridge-port MAC
//! counts consistent.

use super::collab::L2Collaborators;
use super::locks::BridgeHeld;
use super::orch::FdbOrchStats;
use super::store::EntryStore;
use super::tracker::ChangeTracker;
use super::types::{FdbEntry, FdbEventKind, FdbKey, UpsertOutcome};
use sonic_sai::BridgePortOid;

#[derive(Debug, Default)]
pub struct FdbCache {
    pub store: EntryStore,
    pub tracker: ChangeTracker,
    pub stats: FdbOrchStats,
}

impl FdbCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts `entry`, moving MAC counts and marking the change for
    /// registered consumers.
    ///
    /// A pending entry generates no event; the confirming write that clears
    /// `pending` reports it as learned.
    pub fn insert(
        &mut self,
        collab: &dyn L2Collaborators,
        held: &BridgeHeld<'_>,
        key: FdbKey,
        entry: FdbEntry,
    ) -> UpsertOutcome {
        let was_pending = self.store.lookup(&key).is_some_and(|e| e.pending);
        let bridge_port = entry.bridge_port;
        let pending = entry.pending;

        let outcome = self.store.upsert(key, entry);
        match outcome {
            UpsertOutcome::Inserted => {
                increment(collab, held, bridge_port);
                self.stats.entries_created += 1;
                if !pending {
                    self.tracker.mark_event(&key, FdbEventKind::Learned, bridge_port);
                }
            }
            UpsertOutcome::Moved { old_port } => {
                decrement(collab, held, old_port);
                increment(collab, held, bridge_port);
                self.stats.entries_moved += 1;
                if !pending {
                    self.tracker.mark_event(&key, FdbEventKind::Moved, bridge_port);
                }
            }
            UpsertOutcome::UpdatedSamePort => {
                self.stats.entries_updated += 1;
                if was_pending && !pending {
                    self.tracker.mark_event(&key, FdbEventKind::Learned, bridge_port);
                }
            }
            UpsertOutcome::AlreadyExists => {}
        }
        outcome
    }

    /// Stores `entry` as-is (attribute set). Returns the replaced entry.
    pub fn update(
        &mut self,
        collab: &dyn L2Collaborators,
        held: &BridgeHeld<'_>,
        key: FdbKey,
        entry: FdbEntry,
    ) -> Option<FdbEntry> {
        let bridge_port = entry.bridge_port;
        let previous = self.store.replace(key, entry);

        match &previous {
            None => {
                increment(collab, held, bridge_port);
                self.stats.entries_created += 1;
                self.tracker.mark_event(&key, FdbEventKind::Learned, bridge_port);
            }
            Some(old) if old.bridge_port != bridge_port => {
                decrement(collab, held, old.bridge_port);
                increment(collab, held, bridge_port);
                self.stats.entries_updated += 1;
                self.stats.entries_moved += 1;
                self.tracker.mark_event(&key, FdbEventKind::Moved, bridge_port);
            }
            Some(_) => self.stats.entries_updated += 1,
        }
        previous
    }

    /// Removes `key`, reporting `event` (aged or flushed) to a registered consumer.
    pub fn remove(
        &mut self,
        collab: &dyn L2Collaborators,
        held: &BridgeHeld<'_>,
        key: &FdbKey,
        event: FdbEventKind,
    ) -> Option<FdbEntry> {
        let entry = self.store.remove(key)?;
        decrement(collab, held, entry.bridge_port);
        self.stats.entries_removed += 1;
        self.tracker.mark_event(key, event, entry.bridge_port);
        Some(entry)
    }
}

fn increment(collab: &dyn L2Collaborators, held: &BridgeHeld<'_>, bridge_port: BridgePortOid) {
    if !bridge_port.is_null() {
        collab.bridge_port_increment_mac_count(held, bridge_port);
    }
}

fn decrement(collab: &dyn L2Collaborators, held: &BridgeHeld<'_>, bridge_port: BridgePortOid) {
    if !bridge_port.is_null() {
        collab.bridge_port_decrement_mac_count(held, bridge_port);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fdb::locks::ModuleLocks;
    use crate::fdb::types::{FdbEntryType, PacketAction};
    use crate::sim::SimulatedL2Topology;
    use pretty_assertions::assert_eq;
    use sonic_sai::PortOid;
    use sonic_types::{MacAddress, VlanId};

    fn vlan() -> VlanId {
        VlanId::new(100).unwrap()
    }

    fn key() -> FdbKey {
        FdbKey::vlan(vlan(), MacAddress::new([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]))
    }

    fn bp(i: u32) -> BridgePortOid {
        BridgePortOid::from_index(i)
    }

    fn topology() -> SimulatedL2Topology {
        SimulatedL2Topology::new()
            .with_vlan(vlan())
            .with_port_bridge_port(bp(1), PortOid::from_index(1))
            .with_port_bridge_port(bp(2), PortOid::from_index(2))
    }

    fn dynamic(i: u32) -> FdbEntry {
        FdbEntry::new(bp(i), FdbEntryType::Dynamic)
    }

    #[test]
    fn test_insert_and_move_adjust_counts_once() {
        let topo = topology();
        let locks = ModuleLocks::new();
        let held = locks.lock_bridge();
        let mut cache = FdbCache::new();
        cache.tracker.register(key(), BridgePortOid::NULL);

        assert_eq!(cache.insert(&topo, &held, key(), dynamic(1)), UpsertOutcome::Inserted);
        assert_eq!(topo.mac_count(bp(1)), 1);

        assert_eq!(
            cache.insert(&topo, &held, key(), dynamic(2)),
            UpsertOutcome::Moved { old_port: bp(1) }
        );
        assert_eq!(topo.mac_count(bp(1)), 0);
        assert_eq!(topo.mac_count(bp(2)), 1);

        let batch = cache.tracker.drain_batch(10);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].event, FdbEventKind::Moved);
        assert_eq!(batch[0].bridge_port, bp(2));
    }

    #[test]
    fn test_duplicate_insert_is_silent() {
        let topo = topology();
        let locks = ModuleLocks::new();
        let held = locks.lock_bridge();
        let mut cache = FdbCache::new();
        cache.tracker.register(key(), BridgePortOid::NULL);

        cache.insert(&topo, &held, key(), dynamic(1));
        cache.tracker.drain_batch(10);

        assert_eq!(cache.insert(&topo, &held, key(), dynamic(1)), UpsertOutcome::AlreadyExists);
        assert_eq!(topo.mac_count(bp(1)), 1);
        assert_eq!(cache.tracker.pending_count(), 0);
    }

    #[test]
    fn test_pending_entry_reported_on_confirmation() {
        let topo = topology();
        let locks = ModuleLocks::new();
        let held = locks.lock_bridge();
        let mut cache = FdbCache::new();
        cache.tracker.register(key(), BridgePortOid::NULL);

        let mut pending = dynamic(1);
        pending.pending = true;
        cache.insert(&topo, &held, key(), pending);
        assert_eq!(cache.tracker.pending_count(), 0);

        assert_eq!(
            cache.insert(&topo, &held, key(), dynamic(1)),
            UpsertOutcome::UpdatedSamePort
        );
        let batch = cache.tracker.drain_batch(10);
        assert_eq!(batch[0].event, FdbEventKind::Learned);
        assert_eq!(topo.mac_count(bp(1)), 1);
    }

    #[test]
    fn test_drop_entry_without_port_is_not_counted() {
        let topo = topology();
        let locks = ModuleLocks::new();
        let held = locks.lock_bridge();
        let mut cache = FdbCache::new();

        let mut drop = FdbEntry::new(BridgePortOid::NULL, FdbEntryType::Static);
        drop.action = PacketAction::Drop;
        cache.insert(&topo, &held, key(), drop);
        assert!(cache.remove(&topo, &held, &key(), FdbEventKind::Flushed).is_some());
        assert_eq!(cache.stats.entries_removed, 1);
    }

    #[test]
    fn test_remove_marks_event() {
        let topo = topology();
        let locks = ModuleLocks::new();
        let held = locks.lock_bridge();
        let mut cache = FdbCache::new();
        cache.tracker.register(key(), BridgePortOid::NULL);

        cache.insert(&topo, &held, key(), dynamic(1));
        let removed = cache.remove(&topo, &held, &key(), FdbEventKind::Aged);
        assert_eq!(removed, Some(dynamic(1)));
        assert_eq!(topo.mac_count(bp(1)), 0);
        assert!(cache.remove(&topo, &held, &key(), FdbEventKind::Aged).is_none());

        let batch = cache.tracker.drain_batch(10);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].event, FdbEventKind::Aged);
    }

    #[test]
    fn test_update_moves_counts() {
        let topo = topology();
        let locks = ModuleLocks::new();
        let held = locks.lock_bridge();
        let mut cache = FdbCache::new();

        cache.insert(&topo, &held, key(), dynamic(1));
        let previous = cache.update(&topo, &held, key(), dynamic(2));
        assert_eq!(previous.map(|e| e.bridge_port), Some(bp(1)));
        assert_eq!(topo.mac_count(bp(1)), 0);
        assert_eq!(topo.mac_count(bp(2)), 1);
        assert_eq!(cache.stats.entries_moved, 1);
    }
}
