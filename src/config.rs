//! Kernel configuration file
//!
//! JSON, every field optional:
//!
//! ```json
//! {
//!   "uid_type": "snowflake",
//!   "machine_id": 17,
//!   "snowflake_cache_enabled": false,
//!   "max_results": 5000,
//!   "log_level": "INFO",
//!   "field_types": { "AGE": ["number"], "NAME": ["text"] },
//!   "holes_file": "/etc/shardscan/holes.json"
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::{Event, Logger, Severity};
use crate::planner::{FieldType, FieldTypeRegistry};
use crate::uid::{MachineId, UidType};

/// Configuration errors. Always fatal: nothing runs on a bad config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Kernel configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelConfig {
    /// Identifier encoding (default "hash")
    #[serde(default)]
    pub uid_type: UidType,

    /// 20-bit machine id, required for snowflake identifiers
    #[serde(default)]
    pub machine_id: Option<i64>,

    /// Whether snowflake counters must be backed by a distributed cache
    #[serde(default)]
    pub snowflake_cache_enabled: bool,

    /// Result cap per query, -1 for unlimited
    #[serde(default = "default_max_results")]
    pub max_results: i64,

    /// Minimum log severity (default "INFO")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Declared value types per field. Absent means no type registry.
    #[serde(default)]
    pub field_types: Option<BTreeMap<String, BTreeSet<FieldType>>>,

    /// JSON file of known index holes, `{ "FIELD": [hole, ...] }`
    #[serde(default)]
    pub holes_file: Option<PathBuf>,
}

fn default_max_results() -> i64 {
    -1
}

fn default_log_level() -> String {
    "INFO".to_string()
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            uid_type: UidType::default(),
            machine_id: None,
            snowflake_cache_enabled: false,
            max_results: default_max_results(),
            log_level: default_log_level(),
            field_types: None,
            holes_file: None,
        }
    }
}

impl KernelConfig {
    /// Load and validate configuration from a file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_json(&content)?;
        Logger::event(
            Event::ConfigLoaded,
            &[
                ("path", &path.display().to_string()),
                ("uid_type", &config.uid_type.to_string()),
            ],
        );
        Ok(config)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: KernelConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate field combinations
    pub fn validate(&self) -> ConfigResult<()> {
        if self.uid_type == UidType::Snowflake {
            MachineId::from_option(self.machine_id)
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }

        if self.max_results < -1 {
            return Err(ConfigError::Invalid(format!(
                "max_results must be -1 (unlimited) or >= 0, got {}",
                self.max_results
            )));
        }

        self.severity()?;
        Ok(())
    }

    /// Parsed minimum log severity
    pub fn severity(&self) -> ConfigResult<Severity> {
        self.log_level.parse().map_err(ConfigError::Invalid)
    }

    /// Applies the configured log level to the process-wide logger
    pub fn apply_logging(&self) -> ConfigResult<()> {
        Logger::set_min_severity(self.severity()?);
        Ok(())
    }

    /// Result cap, `None` when unlimited
    pub fn result_cap(&self) -> Option<u64> {
        u64::try_from(self.max_results).ok()
    }

    /// Type registry built from `field_types`, if configured
    pub fn type_registry(&self) -> Option<FieldTypeRegistry> {
        self.field_types.as_ref().map(|types| {
            types
                .iter()
                .map(|(field, declared)| (field.clone(), declared.iter().copied()))
                .collect()
        })
    }
}
