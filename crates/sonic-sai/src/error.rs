//! SAI status codes and adapter errors.
//!
//! Hardware adapters report failures as [`SaiError`]; every error can be
//! reduced back to the [`SaiStatus`] a SAI caller expects to see.

use std::fmt;
use thiserror::Error;

const ATTR_RANGE: i32 = 0x10000;
const INVALID_ATTRIBUTE_BASE: i32 = -0x10000;
const INVALID_ATTR_VALUE_BASE: i32 = -0x20000;
const UNKNOWN_ATTRIBUTE_BASE: i32 = -0x40000;

/// SAI status codes (`sai_status_t`).
///
/// The attribute-scoped codes carry the position of the offending attribute
/// in the caller's attribute list, as SAI encodes them (`*_0 - index`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaiStatus {
    Success,
    Failure,
    NotSupported,
    NoMemory,
    InsufficientResources,
    InvalidParameter,
    ItemAlreadyExists,
    ItemNotFound,
    Uninitialized,
    TableFull,
    MandatoryAttributeMissing,
    NotImplemented,
    AddrNotFound,
    ObjectInUse,
    InvalidObjectType,
    InvalidObjectId,
    NotExecuted,
    InvalidAttribute(u16),
    InvalidAttrValue(u16),
    UnknownAttribute(u16),
}

impl SaiStatus {
    /// Decodes a raw status. Unknown codes collapse to `Failure`.
    pub fn from_raw(status: i32) -> Self {
        let attr_index = |base: i32| -> Option<u16> {
            let offset = base - status;
            (0..ATTR_RANGE).contains(&offset).then(|| offset as u16)
        };

        match status {
            0 => SaiStatus::Success,
            -2 => SaiStatus::NotSupported,
            -3 => SaiStatus::NoMemory,
            -4 => SaiStatus::InsufficientResources,
            -5 => SaiStatus::InvalidParameter,
            -6 => SaiStatus::ItemAlreadyExists,
            -7 => SaiStatus::ItemNotFound,
            -12 => SaiStatus::Uninitialized,
            -13 => SaiStatus::TableFull,
            -14 => SaiStatus::MandatoryAttributeMissing,
            -15 => SaiStatus::NotImplemented,
            -16 => SaiStatus::AddrNotFound,
            -17 => SaiStatus::ObjectInUse,
            -18 => SaiStatus::InvalidObjectType,
            -19 => SaiStatus::InvalidObjectId,
            -23 => SaiStatus::NotExecuted,
            _ => {
                if let Some(i) = attr_index(INVALID_ATTRIBUTE_BASE) {
                    SaiStatus::InvalidAttribute(i)
                } else if let Some(i) = attr_index(INVALID_ATTR_VALUE_BASE) {
                    SaiStatus::InvalidAttrValue(i)
                } else if let Some(i) = attr_index(UNKNOWN_ATTRIBUTE_BASE) {
                    SaiStatus::UnknownAttribute(i)
                } else {
                    SaiStatus::Failure
                }
            }
        }
    }

    /// Encodes the status as a raw `sai_status_t`.
    pub fn to_raw(self) -> i32 {
        match self {
            SaiStatus::Success => 0,
            SaiStatus::Failure => -1,
            SaiStatus::NotSupported => -2,
            SaiStatus::NoMemory => -3,
            SaiStatus::InsufficientResources => -4,
            SaiStatus::InvalidParameter => -5,
            SaiStatus::ItemAlreadyExists => -6,
            SaiStatus::ItemNotFound => -7,
            SaiStatus::Uninitialized => -12,
            SaiStatus::TableFull => -13,
            SaiStatus::MandatoryAttributeMissing => -14,
            SaiStatus::NotImplemented => -15,
            SaiStatus::AddrNotFound => -16,
            SaiStatus::ObjectInUse => -17,
            SaiStatus::InvalidObjectType => -18,
            SaiStatus::InvalidObjectId => -19,
            SaiStatus::NotExecuted => -23,
            SaiStatus::InvalidAttribute(i) => INVALID_ATTRIBUTE_BASE - i32::from(i),
            SaiStatus::InvalidAttrValue(i) => INVALID_ATTR_VALUE_BASE - i32::from(i),
            SaiStatus::UnknownAttribute(i) => UNKNOWN_ATTRIBUTE_BASE - i32::from(i),
        }
    }

    pub fn is_success(&self) -> bool {
        *self == SaiStatus::Success
    }

    /// Converts to a Result, returning Ok(()) for success.
    pub fn into_result(self) -> SaiResult<()> {
        if self.is_success() {
            Ok(())
        } else {
            Err(SaiError::from_status(self))
        }
    }
}

impl fmt::Display for SaiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SaiStatus::Success => "SAI_STATUS_SUCCESS",
            SaiStatus::Failure => "SAI_STATUS_FAILURE",
            SaiStatus::NotSupported => "SAI_STATUS_NOT_SUPPORTED",
            SaiStatus::NoMemory => "SAI_STATUS_NO_MEMORY",
            SaiStatus::InsufficientResources => "SAI_STATUS_INSUFFICIENT_RESOURCES",
            SaiStatus::InvalidParameter => "SAI_STATUS_INVALID_PARAMETER",
            SaiStatus::ItemAlreadyExists => "SAI_STATUS_ITEM_ALREADY_EXISTS",
            SaiStatus::ItemNotFound => "SAI_STATUS_ITEM_NOT_FOUND",
            SaiStatus::Uninitialized => "SAI_STATUS_UNINITIALIZED",
            SaiStatus::TableFull => "SAI_STATUS_TABLE_FULL",
            SaiStatus::MandatoryAttributeMissing => "SAI_STATUS_MANDATORY_ATTRIBUTE_MISSING",
            SaiStatus::NotImplemented => "SAI_STATUS_NOT_IMPLEMENTED",
            SaiStatus::AddrNotFound => "SAI_STATUS_ADDR_NOT_FOUND",
            SaiStatus::ObjectInUse => "SAI_STATUS_OBJECT_IN_USE",
            SaiStatus::InvalidObjectType => "SAI_STATUS_INVALID_OBJECT_TYPE",
            SaiStatus::InvalidObjectId => "SAI_STATUS_INVALID_OBJECT_ID",
            SaiStatus::NotExecuted => "SAI_STATUS_NOT_EXECUTED",
            SaiStatus::InvalidAttribute(i) => return write!(f, "SAI_STATUS_INVALID_ATTRIBUTE_{}", i),
            SaiStatus::InvalidAttrValue(i) => return write!(f, "SAI_STATUS_INVALID_ATTR_VALUE_{}", i),
            SaiStatus::UnknownAttribute(i) => return write!(f, "SAI_STATUS_UNKNOWN_ATTRIBUTE_{}", i),
        };
        f.write_str(name)
    }
}

/// Error type for SAI operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaiError {
    /// SAI API returned an error status.
    #[error("SAI operation failed: {status}")]
    Status { status: SaiStatus },

    #[error("Feature not supported: {feature}")]
    NotSupported { feature: String },

    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    #[error("Item not found: {item}")]
    NotFound { item: String },

    #[error("Item already exists: {item}")]
    AlreadyExists { item: String },

    /// Hardware table is full.
    #[error("Table full: {table}")]
    TableFull { table: String },

    #[error("SAI not initialized")]
    Uninitialized,

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl SaiError {
    /// Wraps a failing status.
    ///
    /// Statuses with a dedicated variant still go through `Status` so the
    /// exact code survives; use the named constructors when context is known.
    pub fn from_status(status: SaiStatus) -> Self {
        match status {
            SaiStatus::Uninitialized => SaiError::Uninitialized,
            _ => SaiError::Status { status },
        }
    }

    pub fn not_supported(feature: impl Into<String>) -> Self {
        SaiError::NotSupported {
            feature: feature.into(),
        }
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        SaiError::InvalidParameter {
            message: message.into(),
        }
    }

    pub fn not_found(item: impl Into<String>) -> Self {
        SaiError::NotFound { item: item.into() }
    }

    pub fn already_exists(item: impl Into<String>) -> Self {
        SaiError::AlreadyExists { item: item.into() }
    }

    pub fn table_full(table: impl Into<String>) -> Self {
        SaiError::TableFull {
            table: table.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        SaiError::Internal {
            message: message.into(),
        }
    }

    /// The SAI status equivalent of this error.
    pub fn status(&self) -> SaiStatus {
        match self {
            SaiError::Status { status } => *status,
            SaiError::NotSupported { .. } => SaiStatus::NotSupported,
            SaiError::InvalidParameter { .. } => SaiStatus::InvalidParameter,
            SaiError::NotFound { .. } => SaiStatus::ItemNotFound,
            SaiError::AlreadyExists { .. } => SaiStatus::ItemAlreadyExists,
            SaiError::TableFull { .. } => SaiStatus::TableFull,
            SaiError::Uninitialized => SaiStatus::Uninitialized,
            SaiError::Internal { .. } => SaiStatus::Failure,
        }
    }

    /// True for "the address is not there" answers, which FDB callers treat as a miss.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.status(),
            SaiStatus::ItemNotFound | SaiStatus::AddrNotFound
        )
    }
}

/// Result type for SAI operations.
pub type SaiResult<T> = Result<T, SaiError>;
