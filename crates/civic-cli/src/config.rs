use civic_core::{ProbeMode, DEFAULT_PROBE_HEADROOM};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DB_POOL_MAX: u32 = 5;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CivicConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub backfill: BackfillConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_db_pool_max")]
    pub pool_max: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            pool_max: default_db_pool_max(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackfillConfig {
    #[serde(default)]
    pub probe_mode: ProbeMode,
    #[serde(default = "default_probe_headroom")]
    pub probe_headroom: u64,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            probe_mode: ProbeMode::default(),
            probe_headroom: default_probe_headroom(),
        }
    }
}

fn default_db_pool_max() -> u32 {
    DEFAULT_DB_POOL_MAX
}

fn default_probe_headroom() -> u64 {
    DEFAULT_PROBE_HEADROOM
}
