//! FDB (Forwarding Database) types.

use serde::Serialize;
use sonic_sai::{BridgeOid, BridgePortOid};
use sonic_types::{MacAddress, VlanId};
use std::fmt;
use std::net::IpAddr;

/// The bridge or VLAN an entry belongs to (`bv_id`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FdbDomain {
    /// .1Q bridge, domain is a VLAN
    Vlan(VlanId),
    /// .1D bridge
    Bridge(BridgeOid),
}

impl FdbDomain {
    pub fn vlan(&self) -> Option<VlanId> {
        match self {
            FdbDomain::Vlan(vlan) => Some(*vlan),
            FdbDomain::Bridge(_) => None,
        }
    }
}

impl fmt::Display for FdbDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FdbDomain::Vlan(vlan) => write!(f, "vlan:{}", vlan),
            FdbDomain::Bridge(bridge) => write!(f, "bridge:{}", bridge),
        }
    }
}

/// Key of an FDB entry. Ordered by domain, then MAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FdbKey {
    pub domain: FdbDomain,
    pub mac: MacAddress,
}

impl FdbKey {
    pub fn new(domain: FdbDomain, mac: MacAddress) -> Self {
        Self { domain, mac }
    }

    pub fn vlan(vlan: VlanId, mac: MacAddress) -> Self {
        Self::new(FdbDomain::Vlan(vlan), mac)
    }

    /// Smallest possible key of a domain.
    pub fn domain_start(domain: FdbDomain) -> Self {
        Self::new(domain, MacAddress::ZERO)
    }
}

impl fmt::Display for FdbKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.domain, self.mac)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FdbEntryType {
    Dynamic,
    Static,
}

/// Packet action applied to frames hitting an entry (`sai_packet_action_t`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PacketAction {
    Drop,
    Forward,
    Copy,
    Trap,
    Log,
    Transit,
}

impl PacketAction {
    /// Actions that send the frame out of a bridge port and so need one.
    pub fn is_forwarding(&self) -> bool {
        matches!(
            self,
            PacketAction::Forward | PacketAction::Copy | PacketAction::Log | PacketAction::Transit
        )
    }

    /// Actions a caller may configure on an entry or a miss action.
    pub fn is_configurable(&self) -> bool {
        matches!(
            self,
            PacketAction::Forward | PacketAction::Trap | PacketAction::Log | PacketAction::Drop
        )
    }
}

/// Cached forwarding state of one MAC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FdbEntry {
    /// NULL for entries whose action does not forward
    #[serde(serialize_with = "serialize_oid")]
    pub bridge_port: BridgePortOid,
    pub entry_type: FdbEntryType,
    pub action: PacketAction,
    pub metadata: u32,
    /// Remote VTEP, only for tunnel bridge ports
    pub endpoint_ip: Option<IpAddr>,
    /// Reported by hardware ahead of confirmation (e.g. during a move)
    pub pending: bool,
}

impl FdbEntry {
    pub fn new(bridge_port: BridgePortOid, entry_type: FdbEntryType) -> Self {
        Self {
            bridge_port,
            entry_type,
            ..Default::default()
        }
    }

    /// Same forwarding decision: port, type, action, tunnel endpoint and
    /// pending state. Metadata does not count.
    ///
    /// `pending` is compared so the confirming write that clears it is an
    /// update, not a duplicate.
    pub fn same_forwarding(&self, other: &FdbEntry) -> bool {
        self.bridge_port == other.bridge_port
            && self.entry_type == other.entry_type
            && self.action == other.action
            && self.endpoint_ip == other.endpoint_ip
            && self.pending == other.pending
    }

    /// Returns a copy with `attr` applied.
    pub fn with_attribute(&self, attr: &FdbAttribute) -> FdbEntry {
        let mut entry = self.clone();
        match attr {
            FdbAttribute::BridgePort(bp) => entry.bridge_port = *bp,
            FdbAttribute::Type(t) => entry.entry_type = *t,
            FdbAttribute::PacketAction(a) => entry.action = *a,
            FdbAttribute::Metadata(m) => entry.metadata = *m,
            FdbAttribute::EndpointIp(ip) => entry.endpoint_ip = Some(*ip),
        }
        entry
    }

    pub fn attribute(&self, id: FdbAttrId) -> Option<FdbAttribute> {
        match id {
            FdbAttrId::BridgePort => Some(FdbAttribute::BridgePort(self.bridge_port)),
            FdbAttrId::Type => Some(FdbAttribute::Type(self.entry_type)),
            FdbAttrId::PacketAction => Some(FdbAttribute::PacketAction(self.action)),
            FdbAttrId::Metadata => Some(FdbAttribute::Metadata(self.metadata)),
            FdbAttrId::EndpointIp => self.endpoint_ip.map(FdbAttribute::EndpointIp),
        }
    }
}

impl Default for FdbEntry {
    fn default() -> Self {
        Self {
            bridge_port: BridgePortOid::NULL,
            entry_type: FdbEntryType::Dynamic,
            action: PacketAction::Forward,
            metadata: 0,
            endpoint_ip: None,
            pending: false,
        }
    }
}

fn serialize_oid<S: serde::Serializer>(oid: &BridgePortOid, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(oid)
}

/// Attribute ids, numbered as `sai_fdb_entry_attr_t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FdbAttrId {
    Type,
    PacketAction,
    BridgePort,
    Metadata,
    EndpointIp,
}

impl FdbAttrId {
    pub fn from_raw(id: u32) -> Option<Self> {
        match id {
            0 => Some(FdbAttrId::Type),
            1 => Some(FdbAttrId::PacketAction),
            3 => Some(FdbAttrId::BridgePort),
            4 => Some(FdbAttrId::Metadata),
            5 => Some(FdbAttrId::EndpointIp),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> u32 {
        match self {
            FdbAttrId::Type => 0,
            FdbAttrId::PacketAction => 1,
            FdbAttrId::BridgePort => 3,
            FdbAttrId::Metadata => 4,
            FdbAttrId::EndpointIp => 5,
        }
    }
}

impl fmt::Display for FdbAttrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FdbAttrId::Type => "SAI_FDB_ENTRY_ATTR_TYPE",
            FdbAttrId::PacketAction => "SAI_FDB_ENTRY_ATTR_PACKET_ACTION",
            FdbAttrId::BridgePort => "SAI_FDB_ENTRY_ATTR_BRIDGE_PORT_ID",
            FdbAttrId::Metadata => "SAI_FDB_ENTRY_ATTR_META_DATA",
            FdbAttrId::EndpointIp => "SAI_FDB_ENTRY_ATTR_ENDPOINT_IP",
        };
        f.write_str(name)
    }
}

/// A typed FDB entry attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FdbAttribute {
    Type(FdbEntryType),
    PacketAction(PacketAction),
    BridgePort(BridgePortOid),
    Metadata(u32),
    EndpointIp(IpAddr),
}

impl FdbAttribute {
    pub fn id(&self) -> FdbAttrId {
        match self {
            FdbAttribute::Type(_) => FdbAttrId::Type,
            FdbAttribute::PacketAction(_) => FdbAttrId::PacketAction,
            FdbAttribute::BridgePort(_) => FdbAttrId::BridgePort,
            FdbAttribute::Metadata(_) => FdbAttrId::Metadata,
            FdbAttribute::EndpointIp(_) => FdbAttrId::EndpointIp,
        }
    }
}

/// FDB lifecycle event kinds (`sai_fdb_event_t`, plus an explicit move).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FdbEventKind {
    Learned,
    Aged,
    Moved,
    Flushed,
}

/// One event reported by the hardware adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FdbHwEvent {
    pub kind: FdbEventKind,
    pub key: FdbKey,
    pub entry: FdbEntry,
}

impl FdbHwEvent {
    pub fn learned(key: FdbKey, bridge_port: BridgePortOid) -> Self {
        Self {
            kind: FdbEventKind::Learned,
            key,
            entry: FdbEntry::new(bridge_port, FdbEntryType::Dynamic),
        }
    }

    pub fn aged(key: FdbKey, bridge_port: BridgePortOid) -> Self {
        Self {
            kind: FdbEventKind::Aged,
            key,
            entry: FdbEntry::new(bridge_port, FdbEntryType::Dynamic),
        }
    }
}

/// A change delivered to the registered subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FdbNotification {
    pub key: FdbKey,
    /// Bridge port at the time of the event
    pub bridge_port: BridgePortOid,
    pub event: FdbEventKind,
}

/// Which entries a flush removes. Unset fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushRequest {
    pub bridge_port: Option<BridgePortOid>,
    pub domain: Option<FdbDomain>,
    /// `None` flushes static and dynamic entries alike
    pub entry_type: Option<FdbEntryType>,
}

impl FlushRequest {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_port(mut self, bridge_port: BridgePortOid) -> Self {
        self.bridge_port = Some(bridge_port);
        self
    }

    pub fn by_domain(mut self, domain: FdbDomain) -> Self {
        self.domain = Some(domain);
        self
    }

    pub fn dynamic_only(mut self) -> Self {
        self.entry_type = Some(FdbEntryType::Dynamic);
        self
    }

    pub fn static_only(mut self) -> Self {
        self.entry_type = Some(FdbEntryType::Static);
        self
    }

    pub fn delete_all(&self) -> bool {
        self.entry_type.is_none()
    }

    pub fn matches(&self, key: &FdbKey, entry: &FdbEntry) -> bool {
        self.domain.map_or(true, |d| d == key.domain)
            && self.bridge_port.map_or(true, |bp| bp == entry.bridge_port)
            && self.entry_type.map_or(true, |t| t == entry.entry_type)
    }
}

/// Outcome of a flush: entries removed, and entries kept because their
/// hardware flush failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushSummary {
    pub flushed: usize,
    pub failed: usize,
}

/// Traffic class for miss actions and CPU flooding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FloodType {
    Unicast,
    Multicast,
    Broadcast,
}

/// Result of a cache insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    UpdatedSamePort,
    Moved { old_port: BridgePortOid },
    /// Identical forwarding state was already cached; nothing changed
    AlreadyExists,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mac(last: u8) -> MacAddress {
        MacAddress::new([0xaa, 0xbb, 0xcc, 0xdd, 0xee, last])
    }

    #[test]
    fn test_key_orders_domain_before_mac() {
        let v10 = VlanId::new(10).unwrap();
        let v20 = VlanId::new(20).unwrap();
        let a = FdbKey::vlan(v10, mac(0xff));
        let b = FdbKey::vlan(v20, mac(0x00));
        assert!(a < b);
        assert!(FdbKey::domain_start(FdbDomain::Vlan(v20)) <= b);
    }

    #[test]
    fn test_forwarding_actions() {
        assert!(PacketAction::Forward.is_forwarding());
        assert!(PacketAction::Transit.is_forwarding());
        assert!(!PacketAction::Drop.is_forwarding());
        assert!(!PacketAction::Trap.is_forwarding());
        assert!(!PacketAction::Copy.is_configurable());
    }

    #[test]
    fn test_same_forwarding_ignores_metadata() {
        let a = FdbEntry::new(BridgePortOid::from_index(1), FdbEntryType::Static);
        let mut b = a.clone();
        b.metadata = 7;
        assert!(a.same_forwarding(&b));
        b.action = PacketAction::Drop;
        assert!(!a.same_forwarding(&b));
    }

    #[test]
    fn test_same_forwarding_compares_endpoint_and_pending() {
        let a = FdbEntry::new(BridgePortOid::from_index(9), FdbEntryType::Static)
            .with_attribute(&FdbAttribute::EndpointIp("10.0.0.1".parse().unwrap()));
        let b = a.with_attribute(&FdbAttribute::EndpointIp("10.0.0.2".parse().unwrap()));
        assert!(!a.same_forwarding(&b));

        let mut confirmed = a.clone();
        let mut pending = a.clone();
        pending.pending = true;
        confirmed.pending = false;
        assert!(!pending.same_forwarding(&confirmed));
    }

    #[test]
    fn test_with_attribute() {
        let entry = FdbEntry::new(BridgePortOid::from_index(1), FdbEntryType::Dynamic);
        let moved = entry.with_attribute(&FdbAttribute::BridgePort(BridgePortOid::from_index(2)));
        assert_eq!(moved.bridge_port, BridgePortOid::from_index(2));
        assert_eq!(entry.bridge_port, BridgePortOid::from_index(1));
        assert_eq!(moved.attribute(FdbAttrId::EndpointIp), None);
    }

    #[test]
    fn test_attr_id_raw_numbering() {
        for id in [
            FdbAttrId::Type,
            FdbAttrId::PacketAction,
            FdbAttrId::BridgePort,
            FdbAttrId::Metadata,
            FdbAttrId::EndpointIp,
        ] {
            assert_eq!(FdbAttrId::from_raw(id.as_raw()), Some(id));
        }
        assert_eq!(FdbAttrId::from_raw(2), None);
    }

    #[test]
    fn test_flush_request_matching() {
        let bp1 = BridgePortOid::from_index(1);
        let bp2 = BridgePortOid::from_index(2);
        let key = FdbKey::vlan(VlanId::new(10).unwrap(), mac(1));
        let dynamic = FdbEntry::new(bp1, FdbEntryType::Dynamic);
        let fixed = FdbEntry::new(bp1, FdbEntryType::Static);

        let req = FlushRequest::all().by_port(bp1).dynamic_only();
        assert!(req.matches(&key, &dynamic));
        assert!(!req.matches(&key, &fixed));
        assert!(!FlushRequest::all().by_port(bp2).matches(&key, &dynamic));
        assert!(FlushRequest::all().delete_all());
        assert!(!req.delete_all());
    }
}
