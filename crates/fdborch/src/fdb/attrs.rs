//! Attribute validation for create and set.

use super::collab::L2Collaborators;
use super::error::{FdbOrchError, Result};
use super::locks::BridgeHeld;
use super::types::{FdbAttrId, FdbAttribute, FdbEntry};
use std::collections::HashSet;

/// Parses raw `SAI_FDB_ENTRY_ATTR_*` ids.
pub fn parse_attr_ids(raw: &[u32]) -> Result<Vec<FdbAttrId>> {
    raw.iter()
        .enumerate()
        .map(|(index, id)| {
            FdbAttrId::from_raw(*id).ok_or_else(|| FdbOrchError::InvalidAttribute {
                attr: id.to_string(),
                index,
            })
        })
        .collect()
}

fn check_value(
    collab: &dyn L2Collaborators,
    held: &BridgeHeld<'_>,
    attr: &FdbAttribute,
    index: usize,
) -> Result<()> {
    match attr {
        FdbAttribute::BridgePort(bp) if !bp.is_null() && !collab.bridge_port_exists(held, *bp) => {
            Err(FdbOrchError::invalid_value(
                attr.id(),
                index,
                format!("unknown bridge port {}", bp),
            ))
        }
        FdbAttribute::PacketAction(action) if !action.is_configurable() => Err(
            FdbOrchError::invalid_value(attr.id(), index, format!("{:?} is not configurable", action)),
        ),
        FdbAttribute::EndpointIp(ip) if ip.is_unspecified() || ip.is_loopback() => Err(
            FdbOrchError::invalid_value(attr.id(), index, format!("{} is not a usable endpoint", ip)),
        ),
        _ => Ok(()),
    }
}

/// Tunnel bridge ports need a remote endpoint; other ports must not have one.
fn check_endpoint(collab: &dyn L2Collaborators, held: &BridgeHeld<'_>, entry: &FdbEntry) -> Result<()> {
    let is_tunnel = !entry.bridge_port.is_null()
        && collab
            .bridge_port_type(held, entry.bridge_port)
            .is_some_and(|t| t.is_tunnel());

    match (is_tunnel, entry.endpoint_ip) {
        (true, None) => Err(FdbOrchError::MandatoryAttributeMissing(FdbAttrId::EndpointIp)),
        (false, Some(ip)) => Err(FdbOrchError::InvalidParameter(format!(
            "endpoint {} set on non-tunnel bridge port {}",
            ip, entry.bridge_port
        ))),
        _ => Ok(()),
    }
}

/// Validates a create attribute list and builds the entry it describes.
pub fn entry_from_attributes(
    collab: &dyn L2Collaborators,
    held: &BridgeHeld<'_>,
    attrs: &[FdbAttribute],
) -> Result<FdbEntry> {
    if attrs.is_empty() {
        return Err(FdbOrchError::InvalidParameter(
            "attribute list is empty".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    let mut entry = FdbEntry::default();
    for (index, attr) in attrs.iter().enumerate() {
        if !seen.insert(attr.id()) {
            return Err(FdbOrchError::InvalidAttribute {
                attr: attr.id().to_string(),
                index,
            });
        }
        check_value(collab, held, attr, index)?;
        entry = entry.with_attribute(attr);
    }

    for required in [FdbAttrId::Type, FdbAttrId::PacketAction] {
        if !seen.contains(&required) {
            return Err(FdbOrchError::MandatoryAttributeMissing(required));
        }
    }
    if entry.action.is_forwarding() && entry.bridge_port.is_null() {
        return Err(FdbOrchError::MandatoryAttributeMissing(FdbAttrId::BridgePort));
    }
    check_endpoint(collab, held, &entry)?;

    Ok(entry)
}

/// Validates `attr` against `current` and returns the updated entry.
pub fn apply_attribute(
    collab: &dyn L2Collaborators,
    held: &BridgeHeld<'_>,
    current: &FdbEntry,
    attr: &FdbAttribute,
) -> Result<FdbEntry> {
    check_value(collab, held, attr, 0)?;
    let updated = current.with_attribute(attr);
    if updated.action.is_forwarding() && updated.bridge_port.is_null() {
        return Err(FdbOrchError::MandatoryAttributeMissing(FdbAttrId::BridgePort));
    }
    check_endpoint(collab, held, &updated)?;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fdb::locks::ModuleLocks;
    use crate::fdb::types::{FdbEntryType, PacketAction};
    use crate::sim::SimulatedL2Topology;
    use pretty_assertions::assert_eq;
    use sonic_sai::{BridgePortOid, PortOid, TunnelOid};
    use std::net::{IpAddr, Ipv4Addr};

    fn bp(i: u32) -> BridgePortOid {
        BridgePortOid::from_index(i)
    }

    fn topology() -> SimulatedL2Topology {
        SimulatedL2Topology::new()
            .with_port_bridge_port(bp(1), PortOid::from_index(1))
            .with_tunnel_bridge_port(bp(9), TunnelOid::from_index(1))
    }

    fn vtep() -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2))
    }

    #[test]
    fn test_valid_create() {
        let topo = topology();
        let locks = ModuleLocks::new();
        let held = locks.lock_bridge();

        let entry = entry_from_attributes(
            &topo,
            &held,
            &[
                FdbAttribute::Type(FdbEntryType::Static),
                FdbAttribute::PacketAction(PacketAction::Forward),
                FdbAttribute::BridgePort(bp(1)),
                FdbAttribute::Metadata(5),
            ],
        )
        .unwrap();
        assert_eq!(entry.bridge_port, bp(1));
        assert_eq!(entry.entry_type, FdbEntryType::Static);
        assert_eq!(entry.metadata, 5);
    }

    #[test]
    fn test_rejections() {
        let topo = topology();
        let locks = ModuleLocks::new();
        let held = locks.lock_bridge();
        let base = [
            FdbAttribute::Type(FdbEntryType::Dynamic),
            FdbAttribute::PacketAction(PacketAction::Forward),
        ];

        assert!(matches!(
            entry_from_attributes(&topo, &held, &[]),
            Err(FdbOrchError::InvalidParameter(_))
        ));

        let dup = [base[0], base[0]];
        assert!(matches!(
            entry_from_attributes(&topo, &held, &dup),
            Err(FdbOrchError::InvalidAttribute { index: 1, .. })
        ));

        let unknown_port = [base[0], base[1], FdbAttribute::BridgePort(bp(7))];
        assert_eq!(
            entry_from_attributes(&topo, &held, &unknown_port).map_err(|e| e.status()),
            Err(sonic_sai::SaiStatus::InvalidAttrValue(2))
        );

        let no_port = entry_from_attributes(&topo, &held, &base);
        assert_eq!(
            no_port,
            Err(FdbOrchError::MandatoryAttributeMissing(FdbAttrId::BridgePort))
        );

        let copy = [base[0], FdbAttribute::PacketAction(PacketAction::Copy)];
        assert!(matches!(
            entry_from_attributes(&topo, &held, &copy),
            Err(FdbOrchError::InvalidAttributeValue { .. })
        ));

        let no_type = [base[1], FdbAttribute::BridgePort(bp(1))];
        assert_eq!(
            entry_from_attributes(&topo, &held, &no_type),
            Err(FdbOrchError::MandatoryAttributeMissing(FdbAttrId::Type))
        );
    }

    #[test]
    fn test_drop_without_port_is_accepted() {
        let topo = topology();
        let locks = ModuleLocks::new();
        let held = locks.lock_bridge();

        let entry = entry_from_attributes(
            &topo,
            &held,
            &[
                FdbAttribute::Type(FdbEntryType::Static),
                FdbAttribute::PacketAction(PacketAction::Drop),
            ],
        )
        .unwrap();
        assert!(entry.bridge_port.is_null());
    }

    #[test]
    fn test_tunnel_endpoint_rules() {
        let topo = topology();
        let locks = ModuleLocks::new();
        let held = locks.lock_bridge();
        let base = [
            FdbAttribute::Type(FdbEntryType::Static),
            FdbAttribute::PacketAction(PacketAction::Forward),
        ];

        let missing = [base[0], base[1], FdbAttribute::BridgePort(bp(9))];
        assert_eq!(
            entry_from_attributes(&topo, &held, &missing),
            Err(FdbOrchError::MandatoryAttributeMissing(FdbAttrId::EndpointIp))
        );

        let ok = [
            base[0],
            base[1],
            FdbAttribute::BridgePort(bp(9)),
            FdbAttribute::EndpointIp(vtep()),
        ];
        assert_eq!(
            entry_from_attributes(&topo, &held, &ok).map(|e| e.endpoint_ip),
            Ok(Some(vtep()))
        );

        let misplaced = [
            base[0],
            base[1],
            FdbAttribute::BridgePort(bp(1)),
            FdbAttribute::EndpointIp(vtep()),
        ];
        assert!(matches!(
            entry_from_attributes(&topo, &held, &misplaced),
            Err(FdbOrchError::InvalidParameter(_))
        ));

        let loopback = [
            base[0],
            base[1],
            FdbAttribute::BridgePort(bp(9)),
            FdbAttribute::EndpointIp(IpAddr::V4(Ipv4Addr::LOCALHOST)),
        ];
        assert!(matches!(
            entry_from_attributes(&topo, &held, &loopback),
            Err(FdbOrchError::InvalidAttributeValue { index: 3, .. })
        ));
    }

    #[test]
    fn test_apply_attribute() {
        let topo = topology();
        let locks = ModuleLocks::new();
        let held = locks.lock_bridge();
        let current = FdbEntry::new(bp(1), FdbEntryType::Dynamic);

        let updated =
            apply_attribute(&topo, &held, &current, &FdbAttribute::PacketAction(PacketAction::Trap))
                .unwrap();
        assert_eq!(updated.action, PacketAction::Trap);

        assert!(matches!(
            apply_attribute(&topo, &held, &current, &FdbAttribute::BridgePort(bp(3))),
            Err(FdbOrchError::InvalidAttributeValue { .. })
        ));
        assert_eq!(
            apply_attribute(&topo, &held, &current, &FdbAttribute::BridgePort(bp(9))),
            Err(FdbOrchError::MandatoryAttributeMissing(FdbAttrId::EndpointIp))
        );
    }

    #[test]
    fn test_parse_attr_ids() {
        assert_eq!(
            parse_attr_ids(&[0, 3]),
            Ok(vec![FdbAttrId::Type, FdbAttrId::BridgePort])
        );
        assert!(matches!(
            parse_attr_ids(&[0, 42]),
            Err(FdbOrchError::InvalidAttribute { index: 1, .. })
        ));
    }
}
