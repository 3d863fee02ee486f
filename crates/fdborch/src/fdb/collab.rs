//! Queries into the bridge, VLAN, STP and LAG modules.
//!
//! The FDB core only reads their state. Calls that depend on bridge or LAG
//! state take the matching lock proof from [`super::locks`].

use super::locks::{BridgeHeld, LagHeld};
use super::types::FdbDomain;
use sonic_sai::{BridgePortOid, LagOid, PortOid, TunnelOid};

/// What a bridge port is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgePortType {
    Port(PortOid),
    Lag(LagOid),
    /// Sub-interface bridge port of a .1D bridge
    SubPort,
    Tunnel(TunnelOid),
}

impl BridgePortType {
    pub fn is_tunnel(&self) -> bool {
        matches!(self, BridgePortType::Tunnel(_))
    }
}

/// Read access to the L2 collaborators.
pub trait L2Collaborators: Send + Sync {
    fn bridge_port_type(&self, held: &BridgeHeld<'_>, bridge_port: BridgePortOid) -> Option<BridgePortType>;

    fn bridge_port_exists(&self, held: &BridgeHeld<'_>, bridge_port: BridgePortOid) -> bool {
        self.bridge_port_type(held, bridge_port).is_some()
    }

    fn bridge_port_admin_up(&self, held: &BridgeHeld<'_>, bridge_port: BridgePortOid) -> bool;

    /// VLAN or .1D bridge known to the bridge module.
    fn domain_exists(&self, held: &BridgeHeld<'_>, domain: FdbDomain) -> bool;

    fn domain_has_member(&self, held: &BridgeHeld<'_>, domain: FdbDomain, bridge_port: BridgePortOid) -> bool;

    fn bridge_port_increment_mac_count(&self, held: &BridgeHeld<'_>, bridge_port: BridgePortOid);

    fn bridge_port_decrement_mac_count(&self, held: &BridgeHeld<'_>, bridge_port: BridgePortOid);

    /// STP port state permits learning. Manages the STP lock internally.
    fn stp_allows_learning(&self, domain: FdbDomain, bridge_port: BridgePortOid) -> bool;

    fn port_oper_up(&self, port: PortOid) -> bool;

    fn lag_exists(&self, held: &LagHeld<'_>, lag: LagOid) -> bool;

    fn lag_has_oper_up_member(&self, held: &LagHeld<'_>, lag: LagOid) -> bool;
}
