//! FDB orchestration logic.

use super::attrs;
use super::cache::FdbCache;
use super::collab::L2Collaborators;
use super::error::{FdbOrchError, Result};
use super::hardware::FdbHardware;
use super::learn;
use super::locks::{BridgeHeld, FdbGuard, ModuleLocks};
use super::tracker::DeregisterError;
use super::types::{
    FdbAttrId, FdbAttribute, FdbEntry, FdbEntryType, FdbEventKind, FdbHwEvent, FdbKey,
    FdbNotification, FloodType, FlushRequest, FlushSummary, PacketAction, UpsertOutcome,
};
use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::config::FdbOrchConfig;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use sonic_sai::BridgePortOid;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::futures::Notified;
use tokio::sync::Notify;

/// Receives batches of change notifications for registered keys.
///
/// Runs while delivery is serialized. It must not call
/// [`FdbOrch::deliver_batch`] or [`FdbOrch::deliver_pending`]; that
/// re-entry deadlocks.
pub type NotificationCallback = Arc<dyn Fn(&[FdbNotification]) + Send + Sync>;

/// Receives hardware events that passed validation.
pub type EventListener = Arc<dyn Fn(&[FdbHwEvent]) + Send + Sync>;

/// FDB orchestrator statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FdbOrchStats {
    pub entries_created: u64,
    pub entries_removed: u64,
    pub entries_updated: u64,
    pub entries_moved: u64,
    pub learns_accepted: u64,
    pub learns_rejected: u64,
    pub aged: u64,
    pub flushed: u64,
    pub flush_failures: u64,
    pub notifications_delivered: u64,
    pub notification_batches: u64,
}

/// FDB orchestrator: the entry cache, its change tracker and the hardware
/// adapter behind one fdb lock.
///
/// Held in an `Arc`; the hardware callback and the notification pipeline
/// keep references to it.
pub struct FdbOrch {
    config: FdbOrchConfig,
    hardware: Arc<dyn FdbHardware>,
    collaborators: Arc<dyn L2Collaborators>,
    locks: Arc<ModuleLocks>,
    cache: Mutex<FdbCache>,
    subscriber: RwLock<Option<NotificationCallback>>,
    event_listener: RwLock<Option<EventListener>>,
    wake: Notify,
    in_flight: AtomicUsize,
    /// Serializes deliveries so per-key order holds across callers
    delivery: Mutex<()>,
}

impl FdbOrch {
    pub fn new(
        config: FdbOrchConfig,
        hardware: Arc<dyn FdbHardware>,
        collaborators: Arc<dyn L2Collaborators>,
        locks: Arc<ModuleLocks>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            hardware,
            collaborators,
            locks,
            cache: Mutex::new(FdbCache::new()),
            subscriber: RwLock::new(None),
            event_listener: RwLock::new(None),
            wake: Notify::new(),
            in_flight: AtomicUsize::new(0),
            delivery: Mutex::new(()),
        })
    }

    /// Initializes the adapter, subscribes to its events and applies the
    /// configured switch-level settings.
    pub fn init(self: &Arc<Self>) -> Result<()> {
        if let Err(e) = self.hardware.init() {
            audit_log!(AuditRecord::new(AuditCategory::Lifecycle, "FdbOrch", "init")
                .with_object_type("fdb")
                .with_error(e.to_string()));
            return Err(e.into());
        }

        let weak: Weak<FdbOrch> = Arc::downgrade(self);
        self.hardware.register_callback(Arc::new(move |events: &[FdbHwEvent]| {
            if let Some(orch) = weak.upgrade() {
                // Failures are logged inside; nothing to report back to the adapter.
                let _ = orch.on_hardware_events(events);
            }
        }));

        if let Some(seconds) = self.config.aging_time_secs {
            self.set_aging_time(seconds)?;
        }
        if let Some(limit) = self.config.max_learned_addresses {
            self.set_max_learned(limit)?;
        }

        audit_log!(AuditRecord::new(AuditCategory::Lifecycle, "FdbOrch", "init")
            .with_outcome(AuditOutcome::Success)
            .with_object_type("fdb")
            .with_details(serde_json::json!({
                "notification_batch_size": self.config.notification_batch_size,
                "max_events_per_callback": self.config.max_events_per_callback,
                "aging_time_secs": self.config.aging_time_secs,
                "max_learned_addresses": self.config.max_learned_addresses,
            })));
        Ok(())
    }

    pub fn config(&self) -> &FdbOrchConfig {
        &self.config
    }

    fn lock(&self) -> FdbGuard<'_, FdbCache> {
        FdbGuard::new(self.cache.lock(), &self.locks)
    }

    fn collab(&self) -> &dyn L2Collaborators {
        self.collaborators.as_ref()
    }

    /// Creates an entry in hardware, then in the cache.
    ///
    /// An entry with the same forwarding state is `AlreadyExists`; different
    /// attributes overwrite it, and a different bridge port is a move.
    pub fn create_entry(&self, key: FdbKey, attributes: &[FdbAttribute]) -> Result<UpsertOutcome> {
        let mut guard = self.lock();
        let (cache, bridge) = guard.lock_bridge();

        self.check_key(&bridge, &key)?;
        let entry = attrs::entry_from_attributes(self.collab(), &bridge, attributes)?;

        if cache.store.lookup(&key).is_some_and(|e| e.same_forwarding(&entry)) {
            return Err(FdbOrchError::AlreadyExists(key));
        }

        if let Err(e) = self.hardware.create_entry(&key, &entry) {
            audit_log!(AuditRecord::new(AuditCategory::EntryCreate, "FdbOrch", "create_fdb_entry")
                .with_object_id(key.to_string())
                .with_object_type("fdb_entry")
                .with_error(e.to_string()));
            return Err(e.into());
        }

        let details = serde_json::json!({ "entry": &entry });
        let outcome = cache.insert(self.collab(), &bridge, key, entry);
        drop(bridge);
        drop(guard);

        audit_log!(AuditRecord::new(AuditCategory::EntryCreate, "FdbOrch", "create_fdb_entry")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(key.to_string())
            .with_object_type("fdb_entry")
            .with_details(details));

        self.wake_pipeline();
        Ok(outcome)
    }

    /// Removes an entry from hardware and, on success, from the cache.
    pub fn remove_entry(&self, key: &FdbKey) -> Result<FdbEntry> {
        let mut guard = self.lock();
        if guard.store.lookup(key).is_none() {
            return Err(FdbOrchError::NotFound(*key));
        }

        if let Err(e) = self.hardware.flush_one(key, false) {
            audit_log!(AuditRecord::new(AuditCategory::EntryDelete, "FdbOrch", "remove_fdb_entry")
                .with_object_id(key.to_string())
                .with_object_type("fdb_entry")
                .with_error(e.to_string()));
            return Err(e.into());
        }

        let (cache, bridge) = guard.lock_bridge();
        let removed = cache
            .remove(self.collab(), &bridge, key, FdbEventKind::Flushed)
            .ok_or(FdbOrchError::NotFound(*key))?;
        drop(bridge);
        drop(guard);

        audit_log!(AuditRecord::new(AuditCategory::EntryDelete, "FdbOrch", "remove_fdb_entry")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(key.to_string())
            .with_object_type("fdb_entry")
            .with_details(serde_json::json!({ "bridge_port": removed.bridge_port.to_string() })));

        self.wake_pipeline();
        Ok(removed)
    }

    fn check_key(&self, bridge: &BridgeHeld<'_>, key: &FdbKey) -> Result<()> {
        if key.mac.is_zero() {
            return Err(FdbOrchError::InvalidKey(format!("{}: zero MAC", key)));
        }
        if !self.collab().domain_exists(bridge, key.domain) {
            return Err(FdbOrchError::InvalidKey(format!("{}: unknown domain", key)));
        }
        Ok(())
    }

    /// Cached entry, or the hardware's copy. The flag is true when the entry
    /// came from the cache; a hardware copy is not cached here.
    fn lookup_or_read(&self, cache: &FdbCache, key: &FdbKey) -> Result<(FdbEntry, bool)> {
        if let Some(entry) = cache.store.lookup(key) {
            return Ok((entry.clone(), true));
        }

        let entry = self.hardware.read_from_hardware(key).map_err(|e| {
            if e.is_not_found() {
                FdbOrchError::NotFound(*key)
            } else {
                FdbOrchError::Hardware(e)
            }
        })?;
        Ok((entry, false))
    }

    /// Sets one attribute. Hardware is written first; the cache only
    /// changes when the write succeeds. On a cache miss the hardware copy is
    /// cached together with the write.
    pub fn set_entry_attribute(&self, key: &FdbKey, attribute: FdbAttribute) -> Result<()> {
        let mut guard = self.lock();
        let (cache, bridge) = guard.lock_bridge();

        self.check_key(&bridge, key)?;
        let (current, _) = self.lookup_or_read(cache, key)?;
        let updated = attrs::apply_attribute(self.collab(), &bridge, &current, &attribute)?;

        if let Err(e) = self.hardware.write_to_hardware(key, &updated) {
            audit_log!(AuditRecord::new(AuditCategory::EntryModify, "FdbOrch", "set_fdb_entry_attribute")
                .with_object_id(key.to_string())
                .with_object_type("fdb_entry")
                .with_details(serde_json::json!({ "attribute": attribute.id().to_string() }))
                .with_error(e.to_string()));
            return Err(e.into());
        }

        cache.update(self.collab(), &bridge, *key, updated);
        drop(bridge);
        drop(guard);

        audit_log!(AuditRecord::new(AuditCategory::EntryModify, "FdbOrch", "set_fdb_entry_attribute")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(key.to_string())
            .with_object_type("fdb_entry")
            .with_details(serde_json::json!({ "attribute": attribute.id().to_string() })));

        self.wake_pipeline();
        Ok(())
    }

    /// Reads attributes, falling back to hardware on a cache miss. The
    /// hardware copy is cached only when every requested id resolves.
    pub fn get_entry_attributes(&self, key: &FdbKey, ids: &[FdbAttrId]) -> Result<Vec<FdbAttribute>> {
        if ids.is_empty() {
            return Err(FdbOrchError::InvalidParameter("empty attribute list".to_string()));
        }

        let mut guard = self.lock();
        let (cache, bridge) = guard.lock_bridge();
        self.check_key(&bridge, key)?;
        let (entry, cached) = self.lookup_or_read(cache, key)?;

        let values = ids
            .iter()
            .enumerate()
            .map(|(index, id)| {
                entry.attribute(*id).ok_or_else(|| FdbOrchError::InvalidAttribute {
                    attr: id.to_string(),
                    index,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if !cached {
            debug_log!("FdbOrch", key = %key, "populated cache from hardware");
            cache.insert(self.collab(), &bridge, *key, entry);
            drop(bridge);
            drop(guard);
            self.wake_pipeline();
        }
        Ok(values)
    }

    /// [`get_entry_attributes`](Self::get_entry_attributes) with ids in their
    /// raw `SAI_FDB_ENTRY_ATTR_*` numbering.
    pub fn get_entry_attributes_raw(&self, key: &FdbKey, raw_ids: &[u32]) -> Result<Vec<FdbAttribute>> {
        let ids = attrs::parse_attr_ids(raw_ids)?;
        self.get_entry_attributes(key, &ids)
    }

    /// Cached entry for `key`. Never consults hardware.
    pub fn get_entry(&self, key: &FdbKey) -> Option<FdbEntry> {
        self.lock().store.lookup(key).cloned()
    }

    pub fn bridge_port_for(&self, key: &FdbKey) -> Option<BridgePortOid> {
        self.lock().store.lookup(key).map(|e| e.bridge_port)
    }

    pub fn entry_count(&self) -> usize {
        self.lock().store.len()
    }

    /// Flushes every cached entry matching `request`, then asks the hardware
    /// for a bulk flush with the same filter.
    ///
    /// A failing per-entry flush is logged and skipped; that entry stays
    /// cached and the walk continues.
    pub fn flush(&self, request: &FlushRequest) -> Result<FlushSummary> {
        let mut guard = self.lock();
        {
            let (_, bridge) = guard.lock_bridge();
            if let Some(bp) = request.bridge_port {
                if !self.collab().bridge_port_exists(&bridge, bp) {
                    return Err(FdbOrchError::InvalidKey(format!("unknown bridge port {}", bp)));
                }
            }
            if let Some(domain) = request.domain {
                if !self.collab().domain_exists(&bridge, domain) {
                    return Err(FdbOrchError::InvalidKey(format!("unknown domain {}", domain)));
                }
            }
        }

        let mut summary = FlushSummary::default();
        let mut cursor: Option<FdbKey> = None;
        loop {
            let next = match request.domain {
                Some(domain) => guard
                    .store
                    .iter_domain(domain, cursor.as_ref())
                    .find(|(k, e)| request.matches(k, e))
                    .map(|(k, _)| *k),
                None => guard
                    .store
                    .iter_from(cursor.as_ref())
                    .find(|(k, e)| request.matches(k, e))
                    .map(|(k, _)| *k),
            };
            let Some(key) = next else {
                break;
            };
            cursor = Some(key);

            match self.hardware.flush_one(&key, false) {
                Ok(()) => {
                    let (cache, bridge) = guard.lock_bridge();
                    cache.remove(self.collab(), &bridge, &key, FdbEventKind::Flushed);
                    cache.stats.flushed += 1;
                    summary.flushed += 1;
                }
                Err(e) => {
                    warn_log!("FdbOrch", key = %key, error = %e, "hardware flush failed, entry kept");
                    guard.stats.flush_failures += 1;
                    summary.failed += 1;
                }
            }
        }
        drop(guard);

        let entry_type = request.entry_type.unwrap_or(FdbEntryType::Dynamic);
        if let Err(e) = self.hardware.flush_all(
            request.bridge_port,
            request.domain,
            request.delete_all(),
            entry_type,
        ) {
            warn_log!("FdbOrch", error = %e, "bulk hardware flush failed");
        }

        let record = AuditRecord::new(AuditCategory::EntryDelete, "FdbOrch", "flush_fdb_entries")
            .with_object_type("fdb_flush")
            .with_details(serde_json::json!({
                "bridge_port": request.bridge_port.map(|bp| bp.to_string()),
                "domain": request.domain.map(|d| d.to_string()),
                "entry_type": request.entry_type,
                "flushed": summary.flushed,
                "failed": summary.failed,
            }));
        if summary.failed == 0 {
            audit_log!(record.with_outcome(AuditOutcome::Success));
        } else {
            audit_log!(record.with_error(format!("{} entries failed to flush", summary.failed)));
        }

        self.wake_pipeline();
        Ok(summary)
    }

    /// Applies one batch of hardware events. Returns how many were accepted.
    ///
    /// Learns and moves are validated against the L2 collaborators; a
    /// rejected one is flushed from hardware so it does not linger without
    /// a cache mirror. Ages and flushes apply to cached entries only.
    pub fn on_hardware_events(&self, events: &[FdbHwEvent]) -> Result<usize> {
        if events.is_empty() || events.len() > self.config.max_events_per_callback {
            warn_log!("FdbOrch", count = events.len(), "dropping hardware event batch of invalid size");
            return Err(FdbOrchError::InvalidParameter(format!(
                "event batch of {} (max {})",
                events.len(),
                self.config.max_events_per_callback
            )));
        }

        let mut accepted = Vec::with_capacity(events.len());
        {
            let mut guard = self.lock();
            let (cache, bridge) = guard.lock_bridge();

            for event in events {
                match event.kind {
                    FdbEventKind::Learned | FdbEventKind::Moved => {
                        match learn::validate_learn(self.collab(), &bridge, &event.key, event.entry.bridge_port) {
                            Ok(()) => {
                                cache.insert(self.collab(), &bridge, event.key, event.entry.clone());
                                cache.stats.learns_accepted += 1;
                                accepted.push(event.clone());
                            }
                            Err(reason) => {
                                debug_log!("FdbOrch", key = %event.key, bridge_port = %event.entry.bridge_port,
                                    reason = %reason, "rejected hardware learn");
                                cache.stats.learns_rejected += 1;
                                // A zero or group MAC names no single hardware
                                // entry; a zero MAC would flush the whole domain.
                                if reason == learn::LearnRejection::NotLearnable {
                                    continue;
                                }
                                if let Err(e) = self.hardware.flush_one(&event.key, false) {
                                    warn_log!("FdbOrch", key = %event.key, error = %e,
                                        "failed to flush rejected learn from hardware");
                                }
                            }
                        }
                    }
                    FdbEventKind::Aged | FdbEventKind::Flushed => {
                        if cache.remove(self.collab(), &bridge, &event.key, event.kind).is_some() {
                            if event.kind == FdbEventKind::Aged {
                                cache.stats.aged += 1;
                            } else {
                                cache.stats.flushed += 1;
                            }
                            accepted.push(event.clone());
                        }
                    }
                }
            }
        }

        self.wake_pipeline();

        if !accepted.is_empty() {
            let listener = self.event_listener.read().clone();
            if let Some(listener) = listener {
                listener(&accepted);
            }
        }
        Ok(accepted.len())
    }

    /// Subscribes `key` to change notifications. Returns true when newly registered.
    pub fn register_entry(&self, key: FdbKey) -> bool {
        let mut guard = self.lock();
        let bridge_port = guard
            .store
            .lookup(&key)
            .map_or(BridgePortOid::NULL, |e| e.bridge_port);
        guard.tracker.register(key, bridge_port)
    }

    /// Drops the subscription for `key`; refused while its last event is undelivered.
    pub fn deregister_entry(&self, key: &FdbKey) -> Result<()> {
        self.lock().tracker.deregister(key).map_err(|e| match e {
            DeregisterError::NotFound => FdbOrchError::NotFound(*key),
            DeregisterError::StillPending => FdbOrchError::ObjectInUse(*key),
        })
    }

    pub fn set_notification_callback(&self, callback: NotificationCallback) {
        *self.subscriber.write() = Some(callback);
        self.wake_pipeline();
    }

    pub fn set_event_listener(&self, listener: EventListener) {
        *self.event_listener.write() = Some(listener);
    }

    pub fn pending_notifications(&self) -> usize {
        self.lock().tracker.pending_count()
    }

    /// Notifications claimed by the current batch and not yet acknowledged.
    pub fn in_flight_notifications(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> FdbOrchStats {
        self.lock().stats.clone()
    }

    fn wake_pipeline(&self) {
        let pending = self.lock().tracker.pending_count();
        if pending > 0 {
            self.wake.notify_one();
        }
    }

    pub(crate) fn notified(&self) -> Notified<'_> {
        self.wake.notified()
    }

    /// Delivers one batch to the subscriber. Returns its size; 0 when
    /// nothing is pending or nobody subscribed. Blocks while another
    /// delivery is running, so it must not be called from the callback.
    pub fn deliver_batch(&self) -> usize {
        let _serial = self.delivery.lock();
        let callback = self.subscriber.read().clone();
        match callback {
            Some(callback) => self.deliver_one(&callback),
            None => 0,
        }
    }

    /// Delivers batches until nothing is pending. Returns the number of
    /// notifications delivered. Not callable from the callback.
    pub fn deliver_pending(&self) -> usize {
        let _serial = self.delivery.lock();
        let Some(callback) = self.subscriber.read().clone() else {
            return 0;
        };

        let mut delivered = 0;
        loop {
            let n = self.deliver_one(&callback);
            if n == 0 {
                break;
            }
            delivered += n;
        }
        delivered
    }

    fn deliver_one(&self, callback: &NotificationCallback) -> usize {
        let batch = {
            let mut guard = self.lock();
            let batch = guard.tracker.drain_batch(self.config.notification_batch_size);
            if !batch.is_empty() {
                self.in_flight.store(batch.len(), Ordering::Release);
                guard.stats.notification_batches += 1;
                guard.stats.notifications_delivered += batch.len() as u64;
            }
            batch
        };
        if batch.is_empty() {
            return 0;
        }

        callback(&batch);
        self.in_flight.store(0, Ordering::Release);
        batch.len()
    }

    // ------------------------------------------------------------------
    // Switch-level L2 attributes
    // ------------------------------------------------------------------

    fn audit_switch_attr(&self, action: &'static str, value: serde_json::Value, result: &sonic_sai::SaiResult<()>) {
        let record = AuditRecord::new(AuditCategory::SwitchConfig, "FdbOrch", action)
            .with_object_type("switch")
            .with_details(value);
        match result {
            Ok(()) => {
                audit_log!(record.with_outcome(AuditOutcome::Success));
            }
            Err(e) => {
                audit_log!(record.with_error(e.to_string()));
            }
        }
    }

    pub fn aging_time(&self) -> Result<u32> {
        Ok(self.hardware.aging_time()?)
    }

    pub fn set_aging_time(&self, seconds: u32) -> Result<()> {
        let result = self.hardware.set_aging_time(seconds);
        self.audit_switch_attr("set_fdb_aging_time", serde_json::json!({ "aging_time": seconds }), &result);
        Ok(result?)
    }

    pub fn max_learned(&self) -> Result<u32> {
        Ok(self.hardware.max_learned()?)
    }

    pub fn set_max_learned(&self, limit: u32) -> Result<()> {
        let result = self.hardware.set_max_learned(limit);
        self.audit_switch_attr(
            "set_max_learned_addresses",
            serde_json::json!({ "max_learned_addresses": limit }),
            &result,
        );
        Ok(result?)
    }

    pub fn miss_action(&self, flood: FloodType) -> Result<PacketAction> {
        Ok(self.hardware.miss_action(flood)?)
    }

    pub fn set_miss_action(&self, flood: FloodType, action: PacketAction) -> Result<()> {
        if !action.is_configurable() {
            return Err(FdbOrchError::invalid_value(
                FdbAttrId::PacketAction,
                0,
                format!("{:?} is not a valid miss action", action),
            ));
        }
        let result = self.hardware.set_miss_action(flood, action);
        self.audit_switch_attr(
            "set_fdb_miss_action",
            serde_json::json!({ "flood": flood, "action": action }),
            &result,
        );
        Ok(result?)
    }

    pub fn cpu_flood_enabled(&self, flood: FloodType) -> Result<bool> {
        Ok(self.hardware.cpu_flood_enabled(flood)?)
    }

    pub fn set_cpu_flood_enabled(&self, flood: FloodType, enabled: bool) -> Result<()> {
        let result = self.hardware.set_cpu_flood_enabled(flood, enabled);
        self.audit_switch_attr(
            "set_cpu_flood_enable",
            serde_json::json!({ "flood": flood, "enabled": enabled }),
            &result,
        );
        Ok(result?)
    }

    pub fn table_size(&self) -> Result<u32> {
        Ok(self.hardware.table_size()?)
    }
}
