//! Hardware adapter boundary.

use super::types::{FdbDomain, FdbEntry, FdbEntryType, FdbHwEvent, FdbKey, FloodType, PacketAction};
use sonic_sai::{BridgePortOid, SaiResult};
use std::sync::Arc;

/// Receives batches of hardware events. Called from the adapter's own thread.
pub type HardwareEventCallback = Arc<dyn Fn(&[FdbHwEvent]) + Send + Sync>;

/// Programming interface of one hardware backend.
///
/// Implementations are called with the fdb lock held for `create_entry`
/// and `flush_one`, so they must not call back into the FDB core
/// synchronously from those methods.
pub trait FdbHardware: Send + Sync {
    fn init(&self) -> SaiResult<()>;

    fn create_entry(&self, key: &FdbKey, entry: &FdbEntry) -> SaiResult<()>;

    /// Removes one entry. With `validate_port` the backend may refuse when
    /// the entry's port does not match the flush request.
    fn flush_one(&self, key: &FdbKey, validate_port: bool) -> SaiResult<()>;

    /// Bulk flush. `delete_all` ignores `entry_type`.
    fn flush_all(
        &self,
        bridge_port: Option<BridgePortOid>,
        domain: Option<FdbDomain>,
        delete_all: bool,
        entry_type: FdbEntryType,
    ) -> SaiResult<()>;

    fn read_from_hardware(&self, key: &FdbKey) -> SaiResult<FdbEntry>;

    fn write_to_hardware(&self, key: &FdbKey, entry: &FdbEntry) -> SaiResult<()>;

    fn aging_time(&self) -> SaiResult<u32>;
    fn set_aging_time(&self, seconds: u32) -> SaiResult<()>;

    fn max_learned(&self) -> SaiResult<u32>;
    fn set_max_learned(&self, limit: u32) -> SaiResult<()>;

    fn miss_action(&self, flood: FloodType) -> SaiResult<PacketAction>;
    fn set_miss_action(&self, flood: FloodType, action: PacketAction) -> SaiResult<()>;

    fn cpu_flood_enabled(&self, flood: FloodType) -> SaiResult<bool>;
    fn set_cpu_flood_enabled(&self, flood: FloodType, enabled: bool) -> SaiResult<()>;

    fn table_size(&self) -> SaiResult<u32>;

    fn register_callback(&self, callback: HardwareEventCallback);
}
