//! Validation of hardware-originated learns.

use super::collab::{BridgePortType, L2Collaborators};
use super::locks::BridgeHeld;
use super::types::{FdbDomain, FdbKey};
use sonic_sai::BridgePortOid;
use std::fmt;

/// Why a learned MAC was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LearnRejection {
    /// Zero or group source address
    NotLearnable,
    BridgePortMissing,
    AdminDown,
    /// Port-type bridge port learning outside a VLAN
    DomainNotVlan,
    NotMember,
    StpBlocking,
    PortOperDown,
    /// LAG missing or without an oper-up member
    LagDown,
    /// Sub-port learning in a domain that is not an existing bridge
    BridgeMissing,
}

impl fmt::Display for LearnRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LearnRejection::NotLearnable => "source mac is not learnable",
            LearnRejection::BridgePortMissing => "bridge port does not exist",
            LearnRejection::AdminDown => "bridge port admin down",
            LearnRejection::DomainNotVlan => "domain is not a vlan",
            LearnRejection::NotMember => "bridge port is not a member of the domain",
            LearnRejection::StpBlocking => "stp state does not allow learning",
            LearnRejection::PortOperDown => "port oper down",
            LearnRejection::LagDown => "lag has no oper-up member",
            LearnRejection::BridgeMissing => "bridge does not exist",
        };
        f.write_str(s)
    }
}

/// Checks that `bridge_port` may learn `key`. Takes the LAG lock, under the
/// held bridge lock, for LAG-backed bridge ports.
pub fn validate_learn(
    collab: &dyn L2Collaborators,
    held: &BridgeHeld<'_>,
    key: &FdbKey,
    bridge_port: BridgePortOid,
) -> Result<(), LearnRejection> {
    if !key.mac.is_learnable() {
        return Err(LearnRejection::NotLearnable);
    }
    let port_type = collab
        .bridge_port_type(held, bridge_port)
        .ok_or(LearnRejection::BridgePortMissing)?;
    if !collab.bridge_port_admin_up(held, bridge_port) {
        return Err(LearnRejection::AdminDown);
    }

    match port_type {
        BridgePortType::Port(port) => {
            check_vlan_learning(collab, held, key, bridge_port)?;
            if !collab.port_oper_up(port) {
                return Err(LearnRejection::PortOperDown);
            }
        }
        BridgePortType::Lag(lag) => {
            check_vlan_learning(collab, held, key, bridge_port)?;
            let lag_held = held.lock_lag();
            if !collab.lag_exists(&lag_held, lag) || !collab.lag_has_oper_up_member(&lag_held, lag) {
                return Err(LearnRejection::LagDown);
            }
        }
        BridgePortType::SubPort => {
            let is_bridge = matches!(key.domain, FdbDomain::Bridge(_));
            if !is_bridge || !collab.domain_exists(held, key.domain) {
                return Err(LearnRejection::BridgeMissing);
            }
        }
        BridgePortType::Tunnel(_) => {}
    }
    Ok(())
}

fn check_vlan_learning(
    collab: &dyn L2Collaborators,
    held: &BridgeHeld<'_>,
    key: &FdbKey,
    bridge_port: BridgePortOid,
) -> Result<(), LearnRejection> {
    if key.domain.vlan().is_none() || !collab.domain_exists(held, key.domain) {
        return Err(LearnRejection::DomainNotVlan);
    }
    if !collab.domain_has_member(held, key.domain, bridge_port) {
        return Err(LearnRejection::NotMember);
    }
    if !collab.stp_allows_learning(key.domain, bridge_port) {
        return Err(LearnRejection::StpBlocking);
    }
    Ok(())
}
