//! Layer-2 primitives used as forwarding-database keys.
//!
//! - [`MacAddress`]: 48-bit Ethernet address, ordered byte-wise
//! - [`VlanId`]: IEEE 802.1Q VLAN identifier (1-4094)

mod mac;
mod vlan;

pub use mac::MacAddress;
pub use vlan::VlanId;

/// Error returned when a textual MAC or VLAN cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("invalid VLAN ID: {0} (must be 1-4094)")]
    InvalidVlanId(u16),

    #[error("invalid VLAN name: {0}")]
    InvalidVlanName(String),
}
