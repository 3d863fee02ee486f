//! Configuration file support for fdborch
//!
//! Loads and validates the daemon configuration from YAML.
//! Default location: /etc/sonic/fdborch.yaml

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default config file path
pub const DEFAULT_CONFIG_PATH: &str = "/etc/sonic/fdborch.yaml";

/// Upper bound on events accepted in one hardware callback
pub const MAX_EVENTS_PER_CALLBACK: usize = 1000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// What the notification pipeline does with undelivered events at shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShutdownPolicy {
    /// Deliver everything still pending before stopping
    #[default]
    Drain,
    /// Stop after the batch in flight; remaining events are logged and dropped
    Drop,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HardwareBackend {
    /// In-memory adapter mirroring flushes into host bridge devices
    #[default]
    Simulated,
}

/// Hardware adapter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareConfig {
    #[serde(default)]
    pub backend: HardwareBackend,

    /// FDB table capacity reported by the adapter
    #[serde(default = "default_table_size")]
    pub table_size: u32,

    /// Directory holding the `br<vlan>` host devices, e.g. /sys/devices/virtual/net.
    /// Host bridge flushing is off when unset.
    #[serde(default)]
    pub bridge_sysfs_root: Option<PathBuf>,
}

/// Complete fdborch configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FdbOrchConfig {
    /// Notifications handed to the subscriber per callback
    #[serde(default = "default_notification_batch_size")]
    pub notification_batch_size: usize,

    #[serde(default = "default_max_events_per_callback")]
    pub max_events_per_callback: usize,

    #[serde(default)]
    pub shutdown_policy: ShutdownPolicy,

    /// Applied to the switch at init when set
    #[serde(default)]
    pub aging_time_secs: Option<u32>,

    #[serde(default)]
    pub max_learned_addresses: Option<u32>,

    #[serde(default)]
    pub hardware: HardwareConfig,
}

fn default_table_size() -> u32 {
    16384
}

fn default_notification_batch_size() -> usize {
    50
}

fn default_max_events_per_callback() -> usize {
    MAX_EVENTS_PER_CALLBACK
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            backend: HardwareBackend::default(),
            table_size: default_table_size(),
            bridge_sysfs_root: None,
        }
    }
}

impl Default for FdbOrchConfig {
    fn default() -> Self {
        Self {
            notification_batch_size: default_notification_batch_size(),
            max_events_per_callback: default_max_events_per_callback(),
            shutdown_policy: ShutdownPolicy::default(),
            aging_time_secs: None,
            max_learned_addresses: None,
            hardware: HardwareConfig::default(),
        }
    }
}

impl FdbOrchConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let config: Self = match fs::read_to_string(path) {
            Ok(content) => serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "config file not found, using defaults");
                Self::default()
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.notification_batch_size == 0 {
            return Err(ConfigError::Invalid(
                "notification_batch_size must be > 0".to_string(),
            ));
        }

        if self.max_events_per_callback == 0 || self.max_events_per_callback > MAX_EVENTS_PER_CALLBACK {
            return Err(ConfigError::Invalid(format!(
                "max_events_per_callback must be 1-{}",
                MAX_EVENTS_PER_CALLBACK
            )));
        }

        if self.hardware.table_size == 0 {
            return Err(ConfigError::Invalid("table_size must be > 0".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = FdbOrchConfig::default();
        assert_eq!(config.notification_batch_size, 50);
        assert_eq!(config.max_events_per_callback, 1000);
        assert_eq!(config.shutdown_policy, ShutdownPolicy::Drain);
        assert_eq!(config.hardware.table_size, 16384);
        assert!(config.aging_time_secs.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = FdbOrchConfig::load_or_default(dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, FdbOrchConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "notification_batch_size: 8\nshutdown_policy: drop\naging_time_secs: 300\nhardware:\n  table_size: 512\n  bridge_sysfs_root: /tmp/net"
        )
        .unwrap();

        let config = FdbOrchConfig::load_or_default(file.path()).unwrap();
        assert_eq!(config.notification_batch_size, 8);
        assert_eq!(config.shutdown_policy, ShutdownPolicy::Drop);
        assert_eq!(config.aging_time_secs, Some(300));
        assert_eq!(config.max_events_per_callback, 1000);
        assert_eq!(config.hardware.table_size, 512);
        assert_eq!(config.hardware.backend, HardwareBackend::Simulated);
        assert_eq!(config.hardware.bridge_sysfs_root, Some(PathBuf::from("/tmp/net")));
    }

    #[test]
    fn test_malformed_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "notification_batch_size: [not, a, number]").unwrap();
        assert!(matches!(
            FdbOrchConfig::load_or_default(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_validation() {
        let mut config = FdbOrchConfig::default();
        config.notification_batch_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = FdbOrchConfig::default();
        config.max_events_per_callback = 1001;
        assert!(config.validate().is_err());

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "max_events_per_callback: 0").unwrap();
        assert!(matches!(
            FdbOrchConfig::load_or_default(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }
}
