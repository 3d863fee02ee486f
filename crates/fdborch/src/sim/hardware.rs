//! Software FDB backend.
//!
//! Mirrors programmed entries in memory and, for VLAN-domain flushes, flushes
//! the host bridge device through sysfs (`<root>/br<vlan>/bridge/flush`).
//! Every entry-level call is recorded so tests can assert on what the core
//! asked the hardware to do, and individual operations can be made to fail.

use crate::config::HardwareConfig;
use crate::fdb::hardware::{FdbHardware, HardwareEventCallback};
use crate::fdb::types::{
    FdbDomain, FdbEntry, FdbEntryType, FdbEventKind, FdbHwEvent, FdbKey, FloodType, PacketAction,
};
use parking_lot::Mutex;
use sonic_sai::{BridgePortOid, SaiError, SaiResult, SaiStatus};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_AGING_TIME: u32 = 600;

/// One recorded adapter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HardwareCall {
    Create(FdbKey),
    FlushOne {
        key: FdbKey,
        validate_port: bool,
    },
    FlushAll {
        bridge_port: Option<BridgePortOid>,
        domain: Option<FdbDomain>,
        delete_all: bool,
        entry_type: FdbEntryType,
    },
    Write(FdbKey),
    Read(FdbKey),
}

/// Operations that can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HardwareOp {
    Create,
    FlushOne,
    FlushAll,
    Write,
    Read,
}

#[derive(Default)]
struct SimState {
    mirror: BTreeMap<FdbKey, FdbEntry>,
    aging_time: u32,
    max_learned: u32,
    miss_actions: HashMap<FloodType, PacketAction>,
    cpu_flood: HashMap<FloodType, bool>,
    callback: Option<HardwareEventCallback>,
    /// `None` key fails the operation for every key
    faults: Vec<(HardwareOp, Option<FdbKey>)>,
    calls: Vec<HardwareCall>,
}

impl SimState {
    fn check_fault(&self, op: HardwareOp, key: Option<&FdbKey>) -> SaiResult<()> {
        let hit = self
            .faults
            .iter()
            .any(|(o, k)| *o == op && (k.is_none() || k.as_ref() == key));
        if hit {
            Err(SaiError::from_status(SaiStatus::Failure))
        } else {
            Ok(())
        }
    }
}

pub struct SimulatedFdbHardware {
    state: Mutex<SimState>,
    table_size: u32,
    sysfs_root: Option<PathBuf>,
}

impl SimulatedFdbHardware {
    pub fn new(table_size: u32) -> Self {
        Self {
            state: Mutex::new(SimState {
                aging_time: DEFAULT_AGING_TIME,
                ..Default::default()
            }),
            table_size,
            sysfs_root: None,
        }
    }

    pub fn from_config(config: &HardwareConfig) -> Self {
        let hw = Self::new(config.table_size);
        match &config.bridge_sysfs_root {
            Some(root) => hw.with_sysfs_root(root),
            None => hw,
        }
    }

    /// Enables host bridge flushes under `root`.
    pub fn with_sysfs_root(mut self, root: impl AsRef<Path>) -> Self {
        self.sysfs_root = Some(root.as_ref().to_path_buf());
        self
    }

    /// Makes `op` fail, for `key` only or for every key.
    pub fn inject_fault(&self, op: HardwareOp, key: Option<FdbKey>) {
        self.state.lock().faults.push((op, key));
    }

    pub fn clear_faults(&self) {
        self.state.lock().faults.clear();
    }

    pub fn calls(&self) -> Vec<HardwareCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Puts an entry in hardware without telling the core, as after a restart.
    pub fn preload_entry(&self, key: FdbKey, entry: FdbEntry) {
        self.state.lock().mirror.insert(key, entry);
    }

    pub fn mirrored(&self, key: &FdbKey) -> Option<FdbEntry> {
        self.state.lock().mirror.get(key).cloned()
    }

    pub fn mirrored_count(&self) -> usize {
        self.state.lock().mirror.len()
    }

    /// Reports events as if the silicon raised them. The mirror is updated
    /// first, then the registered callback runs without the simulator lock.
    /// Returns false when no callback is registered.
    pub fn inject_events(&self, events: &[FdbHwEvent]) -> bool {
        let callback = {
            let mut state = self.state.lock();
            for event in events {
                match event.kind {
                    FdbEventKind::Learned | FdbEventKind::Moved => {
                        state.mirror.insert(event.key, event.entry.clone());
                    }
                    FdbEventKind::Aged | FdbEventKind::Flushed => {
                        state.mirror.remove(&event.key);
                    }
                }
            }
            state.callback.clone()
        };

        match callback {
            Some(callback) => {
                callback(events);
                true
            }
            None => false,
        }
    }

    fn bridge_flush(&self, domain: FdbDomain) {
        let (Some(root), Some(vlan)) = (&self.sysfs_root, domain.vlan()) else {
            return;
        };
        let path = root.join(vlan.bridge_device()).join("bridge").join("flush");
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no host bridge to flush");
            return;
        }
        if let Err(e) = fs::write(&path, "1\n") {
            tracing::warn!(path = %path.display(), error = %e, "host bridge flush failed");
        }
    }
}

impl FdbHardware for SimulatedFdbHardware {
    fn init(&self) -> SaiResult<()> {
        tracing::debug!(table_size = self.table_size, "simulated FDB initialized");
        Ok(())
    }

    fn create_entry(&self, key: &FdbKey, entry: &FdbEntry) -> SaiResult<()> {
        let mut state = self.state.lock();
        state.calls.push(HardwareCall::Create(*key));
        state.check_fault(HardwareOp::Create, Some(key))?;

        let full = state.mirror.len() >= self.table_size as usize;
        if full && !state.mirror.contains_key(key) {
            return Err(SaiError::table_full("fdb"));
        }
        state.mirror.insert(*key, entry.clone());
        Ok(())
    }

    fn flush_one(&self, key: &FdbKey, validate_port: bool) -> SaiResult<()> {
        {
            let mut state = self.state.lock();
            state.calls.push(HardwareCall::FlushOne {
                key: *key,
                validate_port,
            });
            state.check_fault(HardwareOp::FlushOne, Some(key))?;

            if key.mac.is_zero() {
                let domain = key.domain;
                state.mirror.retain(|k, _| k.domain != domain);
            } else {
                state.mirror.remove(key);
            }
        }
        if key.mac.is_zero() {
            self.bridge_flush(key.domain);
        }
        Ok(())
    }

    fn flush_all(
        &self,
        bridge_port: Option<BridgePortOid>,
        domain: Option<FdbDomain>,
        delete_all: bool,
        entry_type: FdbEntryType,
    ) -> SaiResult<()> {
        {
            let mut state = self.state.lock();
            state.calls.push(HardwareCall::FlushAll {
                bridge_port,
                domain,
                delete_all,
                entry_type,
            });
            state.check_fault(HardwareOp::FlushAll, None)?;

            state.mirror.retain(|k, e| {
                let matches = domain.map_or(true, |d| d == k.domain)
                    && bridge_port.map_or(true, |bp| bp == e.bridge_port)
                    && (delete_all || e.entry_type == entry_type);
                !matches
            });
        }
        if let Some(domain) = domain {
            self.bridge_flush(domain);
        }
        Ok(())
    }

    fn read_from_hardware(&self, key: &FdbKey) -> SaiResult<FdbEntry> {
        let mut state = self.state.lock();
        state.calls.push(HardwareCall::Read(*key));
        state.check_fault(HardwareOp::Read, Some(key))?;
        state
            .mirror
            .get(key)
            .cloned()
            .ok_or_else(|| SaiError::from_status(SaiStatus::AddrNotFound))
    }

    fn write_to_hardware(&self, key: &FdbKey, entry: &FdbEntry) -> SaiResult<()> {
        let mut state = self.state.lock();
        state.calls.push(HardwareCall::Write(*key));
        state.check_fault(HardwareOp::Write, Some(key))?;
        state.mirror.insert(*key, entry.clone());
        Ok(())
    }

    fn aging_time(&self) -> SaiResult<u32> {
        Ok(self.state.lock().aging_time)
    }

    fn set_aging_time(&self, seconds: u32) -> SaiResult<()> {
        self.state.lock().aging_time = seconds;
        Ok(())
    }

    fn max_learned(&self) -> SaiResult<u32> {
        Ok(self.state.lock().max_learned)
    }

    fn set_max_learned(&self, limit: u32) -> SaiResult<()> {
        self.state.lock().max_learned = limit;
        Ok(())
    }

    fn miss_action(&self, flood: FloodType) -> SaiResult<PacketAction> {
        Ok(self
            .state
            .lock()
            .miss_actions
            .get(&flood)
            .copied()
            .unwrap_or(PacketAction::Forward))
    }

    fn set_miss_action(&self, flood: FloodType, action: PacketAction) -> SaiResult<()> {
        self.state.lock().miss_actions.insert(flood, action);
        Ok(())
    }

    fn cpu_flood_enabled(&self, flood: FloodType) -> SaiResult<bool> {
        if flood == FloodType::Unicast {
            return Err(SaiError::not_supported("unicast cpu flood"));
        }
        Ok(self.state.lock().cpu_flood.get(&flood).copied().unwrap_or(false))
    }

    fn set_cpu_flood_enabled(&self, flood: FloodType, enabled: bool) -> SaiResult<()> {
        if flood == FloodType::Unicast {
            return Err(SaiError::not_supported("unicast cpu flood"));
        }
        self.state.lock().cpu_flood.insert(flood, enabled);
        Ok(())
    }

    fn table_size(&self) -> SaiResult<u32> {
        Ok(self.table_size)
    }

    fn register_callback(&self, callback: HardwareEventCallback) {
        self.state.lock().callback = Some(callback);
    }
}
