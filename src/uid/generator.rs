//! Configuration-driven identifier generator
//!
//! Picks the hash-based or snowflake encoding from [`KernelConfig`]. A
//! snowflake generator needs a machine id; without a distributed counter
//! cache it still works but logs that clock roll-back can cause collisions.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::KernelConfig;
use crate::observability::{Event, Logger, MetricsRegistry};

use super::counter::{
    CachedCounterSource, CounterCache, CounterSource, LocalCounterSource, MachineId,
};
use super::errors::{UidError, UidResult};
use super::identifier::{Uid, UidVariant};

/// Configured identifier encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UidType {
    #[default]
    Hash,
    Snowflake,
}

impl fmt::Display for UidType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UidType::Hash => write!(f, "hash"),
            UidType::Snowflake => write!(f, "snowflake"),
        }
    }
}

enum GeneratorKind {
    Hash,
    Snowflake {
        machine_id: MachineId,
        counters: Arc<dyn CounterSource>,
    },
}

/// Generates identifiers of one configured variant
pub struct UidGenerator {
    kind: GeneratorKind,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl UidGenerator {
    /// Hash-based generator
    pub fn hash() -> Self {
        Self {
            kind: GeneratorKind::Hash,
            metrics: None,
        }
    }

    /// Snowflake generator over an explicit counter source
    pub fn snowflake(machine_id: Option<i64>, counters: Arc<dyn CounterSource>) -> UidResult<Self> {
        let machine_id = MachineId::from_option(machine_id)?;
        Ok(Self {
            kind: GeneratorKind::Snowflake {
                machine_id,
                counters,
            },
            metrics: None,
        })
    }

    /// Builds the generator the configuration asks for.
    ///
    /// Snowflake generation uses `cache` when one is supplied. With
    /// `snowflake_cache_enabled` set and no cache, this is a configuration
    /// error. With neither, a local counter is used and a warning is logged.
    pub fn from_config(
        config: &KernelConfig,
        cache: Option<Arc<dyn CounterCache>>,
    ) -> UidResult<Self> {
        let generator = match config.uid_type {
            UidType::Hash => Self::hash(),
            UidType::Snowflake => {
                // Validate before touching the cache
                let machine_id = MachineId::from_option(config.machine_id)?;
                let counters: Arc<dyn CounterSource> = match cache {
                    Some(cache) => Arc::new(CachedCounterSource::new(cache)),
                    None if config.snowflake_cache_enabled => {
                        return Err(UidError::Configuration(
                            "snowflake_cache_enabled is set but no counter cache was supplied"
                                .to_string(),
                        ))
                    }
                    None => {
                        Logger::event(
                            Event::SnowflakeCacheDisabled,
                            &[(
                                "reason",
                                "generating snowflake ids without caching could cause uid collisions in the event of clock roll-back",
                            )],
                        );
                        Arc::new(LocalCounterSource::new())
                    }
                };
                Self::snowflake(Some(machine_id.value() as i64), counters)?
            }
        };

        Logger::event(
            Event::UidGeneratorCreated,
            &[("uid_type", &config.uid_type.to_string())],
        );
        Ok(generator)
    }

    /// Attach a metrics registry counting generated identifiers
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Variant this generator produces
    pub fn variant(&self) -> UidVariant {
        match self.kind {
            GeneratorKind::Hash => UidVariant::HashBased,
            GeneratorKind::Snowflake { .. } => UidVariant::Snowflake,
        }
    }

    /// Generate an identifier for `content`.
    ///
    /// Snowflake identifiers use `timestamp`, or the current time when absent.
    pub fn generate(
        &self,
        content: &[u8],
        timestamp: Option<DateTime<Utc>>,
        extras: &[&str],
    ) -> UidResult<Uid> {
        let uid = match &self.kind {
            GeneratorKind::Hash => Uid::new_hash(content, timestamp, extras),
            GeneratorKind::Snowflake {
                machine_id,
                counters,
            } => Uid::new_snowflake_for(
                *machine_id,
                timestamp.unwrap_or_else(Utc::now),
                counters.as_ref(),
                extras,
            )?,
        };

        if let Some(metrics) = &self.metrics {
            metrics.increment_uids_generated();
        }
        Ok(uid)
    }
}
