//! Type-safe SAI object ids.
//!
//! A raw SAI object id is an opaque `u64`. The wrappers here tag it with the
//! kind of object it names, and ids are composed as `object type << 48 | index`
//! so the kind can also be recovered from the raw value.

use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

/// Raw SAI object ID type (matches sai_object_id_t in C).
pub type RawSaiObjectId = u64;

const OBJECT_TYPE_SHIFT: u32 = 48;
const INDEX_MASK: RawSaiObjectId = (1 << OBJECT_TYPE_SHIFT) - 1;

/// Marker trait for SAI object kinds.
pub trait SaiObjectKind: Send + Sync + 'static {
    /// SAI object type number (`sai_object_type_t`).
    const OBJECT_TYPE: u16;

    /// Returns the SAI object type name for debugging.
    fn type_name() -> &'static str;
}

/// A SAI object id tagged with its object kind.
///
/// Ids are totally ordered by raw value, which lets them take part in
/// ordered map keys.
pub struct SaiObjectId<T: SaiObjectKind> {
    raw: RawSaiObjectId,
    _marker: PhantomData<T>,
}

impl<T: SaiObjectKind> SaiObjectId<T> {
    /// The null object ID (SAI_NULL_OBJECT_ID).
    pub const NULL: Self = Self::from_raw_unchecked(0);

    /// Returns `None` for the null id.
    pub fn from_raw(raw: RawSaiObjectId) -> Option<Self> {
        (raw != 0).then(|| Self::from_raw_unchecked(raw))
    }

    /// Wraps a raw value as-is, null included.
    pub const fn from_raw_unchecked(raw: RawSaiObjectId) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    /// Composes an id of this kind from an index (index 0 is allowed and is not null).
    pub const fn from_index(index: u32) -> Self {
        let raw = ((T::OBJECT_TYPE as RawSaiObjectId) << OBJECT_TYPE_SHIFT) | index as RawSaiObjectId;
        Self::from_raw_unchecked(raw)
    }

    pub const fn as_raw(&self) -> RawSaiObjectId {
        self.raw
    }

    pub const fn index(&self) -> RawSaiObjectId {
        self.raw & INDEX_MASK
    }

    pub const fn is_null(&self) -> bool {
        self.raw == 0
    }

    /// True when the raw value carries this kind's object type.
    pub const fn has_kind(raw: RawSaiObjectId) -> bool {
        raw != 0 && (raw >> OBJECT_TYPE_SHIFT) == T::OBJECT_TYPE as RawSaiObjectId
    }
}

impl<T: SaiObjectKind> Clone for SaiObjectId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: SaiObjectKind> Copy for SaiObjectId<T> {}

impl<T: SaiObjectKind> fmt::Debug for SaiObjectId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:016x})", T::type_name(), self.raw)
    }
}

impl<T: SaiObjectKind> fmt::Display for SaiObjectId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.raw)
    }
}

impl<T: SaiObjectKind> PartialEq for SaiObjectId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T: SaiObjectKind> Eq for SaiObjectId<T> {}

impl<T: SaiObjectKind> PartialOrd for SaiObjectId<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: SaiObjectKind> Ord for SaiObjectId<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<T: SaiObjectKind> Hash for SaiObjectId<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T: SaiObjectKind> Default for SaiObjectId<T> {
    fn default() -> Self {
        Self::NULL
    }
}

macro_rules! define_object_kind {
    ($name:ident, $object_type:literal, $type_name:literal, $oid_alias:ident) => {
        #[doc = concat!("Marker type for SAI ", $type_name, " objects.")]
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl SaiObjectKind for $name {
            const OBJECT_TYPE: u16 = $object_type;

            fn type_name() -> &'static str {
                $type_name
            }
        }

        #[doc = concat!("Object id of a SAI ", $type_name, ".")]
        pub type $oid_alias = SaiObjectId<$name>;
    };
}

// Object type numbers follow sai_object_type_t.
define_object_kind!(PortKind, 1, "Port", PortOid);
define_object_kind!(LagKind, 2, "Lag", LagOid);
define_object_kind!(SwitchKind, 33, "Switch", SwitchOid);
define_object_kind!(VlanKind, 38, "Vlan", VlanOid);
define_object_kind!(TunnelKind, 42, "Tunnel", TunnelOid);
define_object_kind!(BridgeKind, 57, "Bridge", BridgeOid);
define_object_kind!(BridgePortKind, 58, "BridgePort", BridgePortOid);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_index_encodes_kind() {
        let bp = BridgePortOid::from_index(3);
        assert_eq!(bp.as_raw(), (58 << 48) | 3);
        assert_eq!(bp.index(), 3);
        assert!(BridgePortOid::has_kind(bp.as_raw()));
        assert!(!LagOid::has_kind(bp.as_raw()));
    }

    #[test]
    fn test_null_oid() {
        assert!(PortOid::from_raw(0).is_none());
        assert!(PortOid::NULL.is_null());
        assert!(!BridgeOid::has_kind(0));
        assert!(!BridgeOid::from_index(0).is_null());
        assert_eq!(BridgePortOid::default(), BridgePortOid::NULL);
    }

    #[test]
    fn test_ordering_follows_raw_value() {
        let a = BridgePortOid::from_index(1);
        let b = BridgePortOid::from_index(2);
        assert!(BridgePortOid::NULL < a);
        assert!(a < b);
    }

    #[test]
    fn test_debug_shows_kind() {
        let lag = LagOid::from_index(1);
        let debug = format!("{:?}", lag);
        assert!(debug.starts_with("Lag(0x0002"));
        assert_eq!(lag.to_string(), "0x0002000000000001");
    }
}
