use std::env;
use std::fs;
use std::path::Path;

use civic_core::ProbeMode;
use tracing::warn;

use crate::config::CivicConfig;

pub(super) fn load_config(path: &Path) -> CivicConfig {
    if !path.exists() {
        return CivicConfig::default();
    }

    let path_display = path.display().to_string();
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            warn!(event = "config_read_failed", path = %path_display, error = %err);
            return CivicConfig::default();
        }
    };
    match serde_yaml::from_str(&contents) {
        Ok(config) => config,
        Err(err) => {
            warn!(event = "config_parse_failed", path = %path_display, error = %err);
            CivicConfig::default()
        }
    }
}

pub(super) fn apply_database_env_overrides(config: &mut CivicConfig) {
    if let Ok(value) = env::var("CIVIC_DB_URL") {
        if value.trim().is_empty() {
            warn!(event = "config_invalid", field = "CIVIC_DB_URL", value = %value);
        } else {
            config.database.url = Some(value.trim().to_string());
        }
    }
    if let Ok(value) = env::var("CIVIC_DB_POOL_MAX") {
        match parse_pool_max(&value) {
            Some(pool_max) => config.database.pool_max = pool_max,
            None => warn!(event = "config_invalid", field = "CIVIC_DB_POOL_MAX", value = %value),
        }
    }
}

pub(super) fn apply_backfill_env_overrides(config: &mut CivicConfig) {
    if let Ok(value) = env::var("CIVIC_PROBE_MODE") {
        match value.parse::<ProbeMode>() {
            Ok(mode) => config.backfill.probe_mode = mode,
            Err(_) => warn!(event = "config_invalid", field = "CIVIC_PROBE_MODE", value = %value),
        }
    }
    if let Ok(value) = env::var("CIVIC_PROBE_HEADROOM") {
        match value.trim().parse::<u64>() {
            Ok(headroom) => config.backfill.probe_headroom = headroom,
            Err(_) => warn!(
                event = "config_invalid",
                field = "CIVIC_PROBE_HEADROOM",
                value = %value
            ),
        }
    }
}

fn parse_pool_max(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok().filter(|max| *max > 0)
}
