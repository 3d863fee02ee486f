//! FDB orchestration errors.

use super::types::{FdbAttrId, FdbKey};
use sonic_sai::{SaiError, SaiStatus};

/// Errors returned by the public FDB operations.
///
/// Validation errors are raised before anything is mutated; `Hardware`
/// means the adapter refused and the cache was left untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FdbOrchError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    /// Unknown or repeated attribute; `index` is its position in the caller's list
    #[error("Invalid attribute {attr} at index {index}")]
    InvalidAttribute { attr: String, index: usize },
    #[error("Invalid value for {attr}: {reason}")]
    InvalidAttributeValue {
        attr: FdbAttrId,
        index: usize,
        reason: String,
    },
    #[error("Mandatory attribute missing: {0}")]
    MandatoryAttributeMissing(FdbAttrId),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("FDB entry not found: {0}")]
    NotFound(FdbKey),
    #[error("FDB entry already exists: {0}")]
    AlreadyExists(FdbKey),
    #[error("Notification for {0} still pending delivery")]
    ObjectInUse(FdbKey),
    #[error("Out of memory")]
    OutOfMemory,
    #[error("Hardware error: {0}")]
    Hardware(#[from] SaiError),
}

impl FdbOrchError {
    /// SAI status reported for this error at the SAI API boundary.
    pub fn status(&self) -> SaiStatus {
        let idx = |i: &usize| u16::try_from(*i).unwrap_or(u16::MAX);
        match self {
            FdbOrchError::InvalidKey(_) => SaiStatus::InvalidObjectId,
            FdbOrchError::InvalidAttribute { index, .. } => SaiStatus::UnknownAttribute(idx(index)),
            FdbOrchError::InvalidAttributeValue { index, .. } => {
                SaiStatus::InvalidAttrValue(idx(index))
            }
            FdbOrchError::MandatoryAttributeMissing(_) => SaiStatus::MandatoryAttributeMissing,
            FdbOrchError::InvalidParameter(_) => SaiStatus::InvalidParameter,
            FdbOrchError::NotFound(_) => SaiStatus::AddrNotFound,
            FdbOrchError::AlreadyExists(_) => SaiStatus::ItemAlreadyExists,
            FdbOrchError::ObjectInUse(_) => SaiStatus::ObjectInUse,
            FdbOrchError::OutOfMemory => SaiStatus::NoMemory,
            FdbOrchError::Hardware(e) => e.status(),
        }
    }

    pub(crate) fn invalid_value(attr: FdbAttrId, index: usize, reason: impl Into<String>) -> Self {
        FdbOrchError::InvalidAttributeValue {
            attr,
            index,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FdbOrchError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sonic_types::{MacAddress, VlanId};

    fn key() -> FdbKey {
        FdbKey::vlan(VlanId::new(100).unwrap(), MacAddress::new([0, 1, 2, 3, 4, 5]))
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(FdbOrchError::NotFound(key()).status(), SaiStatus::AddrNotFound);
        assert_eq!(
            FdbOrchError::AlreadyExists(key()).status(),
            SaiStatus::ItemAlreadyExists
        );
        assert_eq!(FdbOrchError::ObjectInUse(key()).status(), SaiStatus::ObjectInUse);
        assert_eq!(
            FdbOrchError::invalid_value(FdbAttrId::BridgePort, 2, "unknown bridge port").status(),
            SaiStatus::InvalidAttrValue(2)
        );
        assert_eq!(
            FdbOrchError::MandatoryAttributeMissing(FdbAttrId::Type).status(),
            SaiStatus::MandatoryAttributeMissing
        );
    }

    #[test]
    fn test_hardware_error_keeps_adapter_status() {
        let err: FdbOrchError = SaiError::table_full("fdb").into();
        assert_eq!(err.status(), SaiStatus::TableFull);
        assert!(err.to_string().contains("Table full"));
    }

    #[test]
    fn test_display_names_key() {
        let msg = FdbOrchError::NotFound(key()).to_string();
        assert_eq!(msg, "FDB entry not found: vlan:100/00:01:02:03:04:05");
    }
}
