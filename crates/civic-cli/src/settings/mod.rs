use std::env;
use std::path::Path;

use anyhow::anyhow;
use civic_core::{BackfillOptions, ProbeMode};
use tracing::warn;

use crate::config::{CivicConfig, DEFAULT_DB_POOL_MAX};

mod env_config;
#[cfg(test)]
mod tests;

pub const DEFAULT_CONFIG_PATH: &str = "civic.yaml";

#[derive(Debug)]
pub struct Settings {
    pub db_url: Option<String>,
    pub db_pool_max: u32,
    pub probe_mode: ProbeMode,
    pub probe_headroom: u64,
}

impl Settings {
    /// Reads `CIVIC_CONFIG_PATH` (default `civic.yaml`), then applies
    /// environment overrides.
    #[must_use]
    pub fn from_env() -> Self {
        let config_path =
            env::var("CIVIC_CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::from_config_path(Path::new(&config_path))
    }

    #[must_use]
    pub fn from_config_path(path: &Path) -> Self {
        let mut config = env_config::load_config(path);
        env_config::apply_database_env_overrides(&mut config);
        env_config::apply_backfill_env_overrides(&mut config);
        Self::from_config(config)
    }

    fn from_config(config: CivicConfig) -> Self {
        let db_pool_max = if config.database.pool_max == 0 {
            warn!(event = "config_invalid", field = "database.pool_max", value = 0);
            DEFAULT_DB_POOL_MAX
        } else {
            config.database.pool_max
        };
        Self {
            db_url: config.database.url,
            db_pool_max,
            probe_mode: config.backfill.probe_mode,
            probe_headroom: config.backfill.probe_headroom,
        }
    }

    pub fn database_url(&self) -> anyhow::Result<&str> {
        self.db_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| anyhow!("database url not set (use --db-url or CIVIC_DB_URL)"))
    }

    #[must_use]
    pub fn backfill_options(&self, dry_run: bool, probe_mode: Option<ProbeMode>) -> BackfillOptions {
        BackfillOptions {
            dry_run,
            probe_mode: probe_mode.unwrap_or(self.probe_mode),
            probe_headroom: self.probe_headroom,
        }
    }
}
