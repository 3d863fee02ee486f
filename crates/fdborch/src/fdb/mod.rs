//! FdbOrch - forwarding database cache and change notification engine.
//!
//! # Layout
//!
//! - [`store`]: ordered entry cache keyed by (domain, MAC)
//! - [`tracker`]: versioned change tracker for registered keys
//! - [`cache`]: both of the above plus counters, behind the fdb lock
//! - [`locks`]: fdb -> bridge -> lag lock hierarchy as guard types
//! - [`orch`]: public operations (create/remove/set/get/flush, hardware events)
//! - [`notify`]: background delivery of change notifications
//! - [`hardware`] / [`collab`]: the adapter and L2 collaborator boundaries

pub mod attrs;
pub mod cache;
pub mod collab;
pub mod error;
pub mod hardware;
pub mod learn;
pub mod locks;
pub mod notify;
pub mod orch;
pub mod store;
pub mod tracker;
pub mod types;

pub use collab::{BridgePortType, L2Collaborators};
pub use error::{FdbOrchError, Result};
pub use hardware::{FdbHardware, HardwareEventCallback};
pub use learn::LearnRejection;
pub use locks::{BridgeHeld, LagHeld, ModuleLocks};
pub use notify::{NotificationPipeline, ShutdownReport};
pub use orch::{EventListener, FdbOrch, FdbOrchStats, NotificationCallback};
pub use tracker::DeregisterError;
pub use types::{
    FdbAttrId, FdbAttribute, FdbDomain, FdbEntry, FdbEntryType, FdbEventKind, FdbHwEvent, FdbKey,
    FdbNotification, FloodType, FlushRequest, FlushSummary, PacketAction, UpsertOutcome,
};
