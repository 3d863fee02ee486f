//! SONiC FdbOrch - forwarding database cache and notification engine
//!
//! Keeps the host-resident copy of the switch's L2 forwarding table in step
//! with hardware and tells interested consumers about learns, ages, moves
//! and flushes.
//!
//! # Architecture
//!
//! ```text
//! API calls ──────┐                                   ┌──> subscriber callback
//!                 ├──> [FdbOrch] ── fdb lock ──> [EntryStore + ChangeTracker]
//! hardware events ┘        │                          │
//!                          ↓                          └──> [NotificationPipeline]
//!                   [FdbHardware] (simulated backend)
//! ```
//!
//! # Key Components
//!
//! - [`fdb::FdbOrch`]: public operations behind the fdb lock
//! - [`fdb::NotificationPipeline`]: background delivery task
//! - [`sim`]: software hardware backend and L2 collaborator model
//! - [`config`]: YAML configuration
//! - [`audit`]: structured audit logging

#[macro_use]
pub mod audit;
pub mod config;
pub mod fdb;
pub mod sim;

pub use config::{ConfigError, FdbOrchConfig, HardwareConfig, ShutdownPolicy};
pub use fdb::{FdbOrch, FdbOrchError, NotificationPipeline};
