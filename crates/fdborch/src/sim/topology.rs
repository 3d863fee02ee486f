//! In-memory model of the bridge, VLAN, STP and LAG modules.

use crate::fdb::collab::{BridgePortType, L2Collaborators};
use crate::fdb::locks::{BridgeHeld, LagHeld};
use crate::fdb::types::FdbDomain;
use parking_lot::RwLock;
use sonic_sai::{BridgeOid, BridgePortOid, LagOid, PortOid, TunnelOid};
use sonic_types::VlanId;
use std::collections::{HashMap, HashSet};

/// STP port state (`sai_stp_port_state_t` plus the 802.1D intermediate states).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StpPortState {
    Disabled,
    Blocking,
    Listening,
    Learning,
    #[default]
    Forwarding,
}

impl StpPortState {
    pub fn allows_learning(&self) -> bool {
        matches!(self, StpPortState::Learning | StpPortState::Forwarding)
    }
}

#[derive(Debug, Clone)]
struct BridgePortState {
    port_type: BridgePortType,
    admin_up: bool,
    mac_count: u32,
}

#[derive(Debug, Default)]
struct TopologyState {
    bridge_ports: HashMap<BridgePortOid, BridgePortState>,
    vlans: HashMap<VlanId, HashSet<BridgePortOid>>,
    bridges: HashSet<BridgeOid>,
    stp: HashMap<(FdbDomain, BridgePortOid), StpPortState>,
    oper_up: HashSet<PortOid>,
    lags: HashMap<LagOid, Vec<PortOid>>,
}

/// Collaborator model used by the daemon and by tests.
///
/// Ports start oper-up, bridge ports admin-up and STP forwarding.
#[derive(Debug, Default)]
pub struct SimulatedL2Topology {
    state: RwLock<TopologyState>,
}

impl SimulatedL2Topology {
    pub fn new() -> Self {
        Self::default()
    }

    fn add_bridge_port(self, bridge_port: BridgePortOid, port_type: BridgePortType) -> Self {
        self.state.write().bridge_ports.insert(
            bridge_port,
            BridgePortState {
                port_type,
                admin_up: true,
                mac_count: 0,
            },
        );
        self
    }

    pub fn with_port_bridge_port(self, bridge_port: BridgePortOid, port: PortOid) -> Self {
        self.state.write().oper_up.insert(port);
        self.add_bridge_port(bridge_port, BridgePortType::Port(port))
    }

    pub fn with_lag_bridge_port(self, bridge_port: BridgePortOid, lag: LagOid) -> Self {
        self.add_bridge_port(bridge_port, BridgePortType::Lag(lag))
    }

    pub fn with_sub_port_bridge_port(self, bridge_port: BridgePortOid) -> Self {
        self.add_bridge_port(bridge_port, BridgePortType::SubPort)
    }

    pub fn with_tunnel_bridge_port(self, bridge_port: BridgePortOid, tunnel: TunnelOid) -> Self {
        self.add_bridge_port(bridge_port, BridgePortType::Tunnel(tunnel))
    }

    pub fn with_vlan(self, vlan: VlanId) -> Self {
        self.state.write().vlans.entry(vlan).or_default();
        self
    }

    pub fn with_vlan_member(self, vlan: VlanId, bridge_port: BridgePortOid) -> Self {
        self.state.write().vlans.entry(vlan).or_default().insert(bridge_port);
        self
    }

    pub fn with_bridge(self, bridge: BridgeOid) -> Self {
        self.state.write().bridges.insert(bridge);
        self
    }

    /// Adds a LAG with its members, all oper-up.
    pub fn with_lag(self, lag: LagOid, members: &[PortOid]) -> Self {
        {
            let mut state = self.state.write();
            state.oper_up.extend(members.iter().copied());
            state.lags.insert(lag, members.to_vec());
        }
        self
    }

    pub fn set_admin_up(&self, bridge_port: BridgePortOid, up: bool) {
        if let Some(bp) = self.state.write().bridge_ports.get_mut(&bridge_port) {
            bp.admin_up = up;
        }
    }

    pub fn set_port_oper_up(&self, port: PortOid, up: bool) {
        let mut state = self.state.write();
        if up {
            state.oper_up.insert(port);
        } else {
            state.oper_up.remove(&port);
        }
    }

    pub fn set_stp_state(&self, domain: FdbDomain, bridge_port: BridgePortOid, stp: StpPortState) {
        self.state.write().stp.insert((domain, bridge_port), stp);
    }

    /// Learned MACs currently counted against `bridge_port`.
    pub fn mac_count(&self, bridge_port: BridgePortOid) -> u32 {
        self.state
            .read()
            .bridge_ports
            .get(&bridge_port)
            .map_or(0, |bp| bp.mac_count)
    }
}

impl L2Collaborators for SimulatedL2Topology {
    fn bridge_port_type(&self, _held: &BridgeHeld<'_>, bridge_port: BridgePortOid) -> Option<BridgePortType> {
        self.state.read().bridge_ports.get(&bridge_port).map(|bp| bp.port_type)
    }

    fn bridge_port_admin_up(&self, _held: &BridgeHeld<'_>, bridge_port: BridgePortOid) -> bool {
        self.state
            .read()
            .bridge_ports
            .get(&bridge_port)
            .is_some_and(|bp| bp.admin_up)
    }

    fn domain_exists(&self, _held: &BridgeHeld<'_>, domain: FdbDomain) -> bool {
        let state = self.state.read();
        match domain {
            FdbDomain::Vlan(vlan) => state.vlans.contains_key(&vlan),
            FdbDomain::Bridge(bridge) => state.bridges.contains(&bridge),
        }
    }

    fn domain_has_member(&self, _held: &BridgeHeld<'_>, domain: FdbDomain, bridge_port: BridgePortOid) -> bool {
        let state = self.state.read();
        match domain {
            FdbDomain::Vlan(vlan) => state
                .vlans
                .get(&vlan)
                .is_some_and(|members| members.contains(&bridge_port)),
            FdbDomain::Bridge(bridge) => {
                state.bridges.contains(&bridge) && state.bridge_ports.contains_key(&bridge_port)
            }
        }
    }

    fn bridge_port_increment_mac_count(&self, _held: &BridgeHeld<'_>, bridge_port: BridgePortOid) {
        if let Some(bp) = self.state.write().bridge_ports.get_mut(&bridge_port) {
            bp.mac_count += 1;
        }
    }

    fn bridge_port_decrement_mac_count(&self, _held: &BridgeHeld<'_>, bridge_port: BridgePortOid) {
        if let Some(bp) = self.state.write().bridge_ports.get_mut(&bridge_port) {
            bp.mac_count = bp.mac_count.saturating_sub(1);
        }
    }

    fn stp_allows_learning(&self, domain: FdbDomain, bridge_port: BridgePortOid) -> bool {
        self.state
            .read()
            .stp
            .get(&(domain, bridge_port))
            .copied()
            .unwrap_or_default()
            .allows_learning()
    }

    fn port_oper_up(&self, port: PortOid) -> bool {
        self.state.read().oper_up.contains(&port)
    }

    fn lag_exists(&self, _held: &LagHeld<'_>, lag: LagOid) -> bool {
        self.state.read().lags.contains_key(&lag)
    }

    fn lag_has_oper_up_member(&self, _held: &LagHeld<'_>, lag: LagOid) -> bool {
        let state = self.state.read();
        state
            .lags
            .get(&lag)
            .is_some_and(|members| members.iter().any(|p| state.oper_up.contains(p)))
    }
}
