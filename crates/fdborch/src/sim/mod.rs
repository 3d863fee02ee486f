//! Simulated hardware and L2 collaborators.
//!
//! Used by the daemon in place of a vendor SDK and by the tests as
//! recording doubles.

mod hardware;
mod topology;

pub use hardware::{HardwareCall, HardwareOp, SimulatedFdbHardware};
pub use topology::{SimulatedL2Topology, StpPortState};
