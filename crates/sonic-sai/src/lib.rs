//! SAI (Switch Abstraction Interface) vocabulary shared by the FDB stack.
//!
//! - [`types`]: type-safe object ids, so a bridge-port id cannot be passed
//!   where a LAG id is expected
//! - [`error`]: SAI status codes and the [`SaiError`] used by hardware adapters
//!
//! ```
//! use sonic_sai::{BridgePortOid, LagOid};
//!
//! let bp = BridgePortOid::from_index(7);
//! let lag = LagOid::from_index(7);
//! assert_ne!(bp.as_raw(), lag.as_raw());
//! ```

pub mod error;
pub mod types;

pub use error::{SaiError, SaiResult, SaiStatus};
pub use types::{
    BridgeKind, BridgeOid, BridgePortKind, BridgePortOid, LagKind, LagOid, PortKind, PortOid,
    RawSaiObjectId, SaiObjectId, SaiObjectKind, SwitchKind, SwitchOid, TunnelKind, TunnelOid, VlanKind,
    VlanOid,
};
