//! Audit trail and logging setup.
//!
//! Every change fdborch makes to the forwarding database (entry create,
//! remove and set, flushes, switch-level L2 attributes, pipeline start and
//! stop) produces an [`AuditRecord`]. [`audit_log!`] emits it on the `audit`
//! tracing target with the full record as JSON in the `audit_json` field.
//!
//! | Outcome | Level |
//! |---------|-------|
//! | Success | info |
//! | InProgress | debug |
//! | Failure | warn |

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// What kind of change a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditCategory {
    /// Aging, learn limit, miss actions, CPU flooding
    SwitchConfig,
    EntryCreate,
    /// Attribute set on an existing entry
    EntryModify,
    /// Removes and flushes
    EntryDelete,
    /// Engine init, pipeline start and stop
    Lifecycle,
}

impl fmt::Display for AuditCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AuditCategory::SwitchConfig => "switch_config",
            AuditCategory::EntryCreate => "entry_create",
            AuditCategory::EntryModify => "entry_modify",
            AuditCategory::EntryDelete => "entry_delete",
            AuditCategory::Lifecycle => "lifecycle",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    Failure,
    InProgress,
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AuditOutcome::Success => "success",
            AuditOutcome::Failure => "failure",
            AuditOutcome::InProgress => "in_progress",
        })
    }
}

/// One audited change. Starts `InProgress`; `with_outcome` or `with_error`
/// settles it before it is emitted.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub category: AuditCategory,
    /// Component name, "FdbOrch" for everything in this crate
    pub source: &'static str,
    pub action: &'static str,
    pub outcome: AuditOutcome,

    /// "fdb_entry", "fdb_flush", "switch" or "fdb"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_type: Option<&'static str>,

    /// Entry key such as "vlan:100/aa:bb:cc:dd:ee:ff"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditRecord {
    pub fn new(category: AuditCategory, source: &'static str, action: &'static str) -> Self {
        Self {
            timestamp: Utc::now(),
            category,
            source,
            action,
            outcome: AuditOutcome::InProgress,
            object_type: None,
            object_id: None,
            details: None,
            error: None,
        }
    }

    pub fn with_outcome(mut self, outcome: AuditOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn with_object_type(mut self, object_type: &'static str) -> Self {
        self.object_type = Some(object_type);
        self
    }

    pub fn with_object_id(mut self, id: impl Into<String>) -> Self {
        self.object_id = Some(id.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Sets the error text; the outcome becomes `Failure`.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self.outcome = AuditOutcome::Failure;
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| format!(r#"{{"action":"{}","error":"unserializable: {}"}}"#, self.action, e))
    }
}

/// Writes `record` to the `audit` target. Use [`audit_log!`] at call sites.
pub fn emit(record: &AuditRecord) {
    let json = record.to_json();
    let object = record.object_id.as_deref().unwrap_or("-");

    match record.outcome {
        AuditOutcome::Success => tracing::info!(
            target: "audit",
            category = %record.category,
            source = record.source,
            object,
            audit_json = %json,
            "{} succeeded",
            record.action
        ),
        AuditOutcome::InProgress => tracing::debug!(
            target: "audit",
            category = %record.category,
            source = record.source,
            object,
            audit_json = %json,
            "{} started",
            record.action
        ),
        AuditOutcome::Failure => tracing::warn!(
            target: "audit",
            category = %record.category,
            source = record.source,
            object,
            error = record.error.as_deref().unwrap_or(""),
            audit_json = %json,
            "{} failed",
            record.action
        ),
    }
}

/// Emits an [`AuditRecord`].
///
/// ```ignore
/// audit_log!(AuditRecord::new(AuditCategory::EntryDelete, "FdbOrch", "remove_fdb_entry")
///     .with_outcome(AuditOutcome::Success)
///     .with_object_id(key.to_string()));
/// ```
#[macro_export]
macro_rules! audit_log {
    ($record:expr) => {
        $crate::audit::emit(&$record)
    };
}

/// Debug line tagged with its source component.
#[macro_export]
macro_rules! debug_log {
    ($source:expr, $($arg:tt)*) => {
        tracing::debug!(source = $source, $($arg)*)
    };
}

#[macro_export]
macro_rules! info_log {
    ($source:expr, $($arg:tt)*) => {
        tracing::info!(source = $source, $($arg)*)
    };
}

#[macro_export]
macro_rules! warn_log {
    ($source:expr, $($arg:tt)*) => {
        tracing::warn!(source = $source, $($arg)*)
    };
}

#[macro_export]
macro_rules! error_log {
    ($source:expr, $($arg:tt)*) => {
        tracing::error!(source = $source, $($arg)*)
    };
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line, for log shipping
    #[default]
    Json,
    /// Multi-line human-readable output
    Pretty,
}

/// Installs the global subscriber. `RUST_LOG` overrides `log_level` when set.
pub fn init_logging(log_level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .json(),
            )
            .init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .pretty(),
            )
            .init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_record_starts_in_progress() {
        let record = AuditRecord::new(AuditCategory::EntryCreate, "FdbOrch", "create_fdb_entry");
        assert_eq!(record.outcome, AuditOutcome::InProgress);
        assert!(record.object_id.is_none());

        let record = record
            .with_outcome(AuditOutcome::Success)
            .with_object_type("fdb_entry")
            .with_object_id("vlan:100/00:11:22:33:44:55");
        assert_eq!(record.outcome, AuditOutcome::Success);
        assert_eq!(record.object_type, Some("fdb_entry"));
        assert_eq!(record.object_id.as_deref(), Some("vlan:100/00:11:22:33:44:55"));
    }

    #[test]
    fn test_with_error_marks_failure() {
        let record = AuditRecord::new(AuditCategory::EntryDelete, "FdbOrch", "remove_fdb_entry")
            .with_outcome(AuditOutcome::Success)
            .with_error("SAI_STATUS_FAILURE");

        assert_eq!(record.outcome, AuditOutcome::Failure);
        assert_eq!(record.error.as_deref(), Some("SAI_STATUS_FAILURE"));
    }

    #[test]
    fn test_json_shape() {
        let record = AuditRecord::new(AuditCategory::SwitchConfig, "FdbOrch", "set_fdb_aging_time")
            .with_outcome(AuditOutcome::Success)
            .with_details(serde_json::json!({ "aging_time": 300 }));

        let json: serde_json::Value = serde_json::from_str(&record.to_json()).unwrap();
        assert_eq!(json["category"], "switch_config");
        assert_eq!(json["outcome"], "success");
        assert_eq!(json["details"]["aging_time"], 300);
        assert!(json.get("object_id").is_none());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_emit_without_subscriber() {
        // No subscriber installed: emitting is a no-op, not a panic.
        audit_log!(AuditRecord::new(AuditCategory::Lifecycle, "FdbOrch", "init")
            .with_error("adapter unavailable"));
    }

    #[test]
    fn test_display() {
        assert_eq!(AuditCategory::EntryModify.to_string(), "entry_modify");
        assert_eq!(AuditOutcome::InProgress.to_string(), "in_progress");
    }
}
