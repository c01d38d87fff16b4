use super::*;
use std::sync::Mutex;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_civic_env() {
    env::remove_var("CIVIC_CONFIG_PATH");
    env::remove_var("CIVIC_DB_URL");
    env::remove_var("CIVIC_DB_POOL_MAX");
    env::remove_var("CIVIC_PROBE_MODE");
    env::remove_var("CIVIC_PROBE_HEADROOM");
}

fn write_config(contents: &str) -> tempfile::TempPath {
    let file = tempfile::Builder::new()
        .prefix("civic-test-config-")
        .suffix(".yaml")
        .tempfile()
        .expect("temp config");
    std::fs::write(file.path(), contents).expect("write config");
    file.into_temp_path()
}

#[test]
fn defaults_without_config_or_env() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|err| err.into_inner());
    clear_civic_env();
    env::set_var("CIVIC_CONFIG_PATH", "/nonexistent/civic.yaml");

    let settings = Settings::from_env();
    assert!(settings.db_url.is_none());
    assert!(settings.database_url().is_err());
    assert_eq!(settings.db_pool_max, DEFAULT_DB_POOL_MAX);
    assert_eq!(settings.probe_mode, ProbeMode::Live);
    assert_eq!(settings.probe_headroom, civic_core::DEFAULT_PROBE_HEADROOM);

    clear_civic_env();
}

#[test]
fn yaml_config_is_loaded() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|err| err.into_inner());
    clear_civic_env();
    let path = write_config(
        "database:\n  url: sqlite://civic.sqlite\n  pool_max: 2\nbackfill:\n  probe_mode: snapshot\n  probe_headroom: 10\n",
    );
    env::set_var("CIVIC_CONFIG_PATH", path.to_path_buf());

    let settings = Settings::from_env();
    assert_eq!(settings.database_url().expect("url"), "sqlite://civic.sqlite");
    assert_eq!(settings.db_pool_max, 2);
    assert_eq!(settings.probe_mode, ProbeMode::Snapshot);
    assert_eq!(settings.probe_headroom, 10);

    clear_civic_env();
}

#[test]
fn env_overrides_yaml() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|err| err.into_inner());
    clear_civic_env();
    let path = write_config("database:\n  url: sqlite://from-file.sqlite\n");
    env::set_var("CIVIC_DB_URL", "postgres://civic@127.0.0.1/civic");
    env::set_var("CIVIC_DB_POOL_MAX", "8");
    env::set_var("CIVIC_PROBE_MODE", "Snapshot");
    env::set_var("CIVIC_PROBE_HEADROOM", "25");

    let settings = Settings::from_config_path(&path);
    assert_eq!(
        settings.database_url().expect("url"),
        "postgres://civic@127.0.0.1/civic"
    );
    assert_eq!(settings.db_pool_max, 8);
    assert_eq!(settings.probe_mode, ProbeMode::Snapshot);
    assert_eq!(settings.probe_headroom, 25);

    clear_civic_env();
}

#[test]
fn invalid_env_values_fall_back() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|err| err.into_inner());
    clear_civic_env();
    env::set_var("CIVIC_CONFIG_PATH", "/nonexistent/civic.yaml");
    env::set_var("CIVIC_DB_POOL_MAX", "0");
    env::set_var("CIVIC_PROBE_MODE", "sideways");
    env::set_var("CIVIC_PROBE_HEADROOM", "-1");

    let settings = Settings::from_env();
    assert_eq!(settings.db_pool_max, DEFAULT_DB_POOL_MAX);
    assert_eq!(settings.probe_mode, ProbeMode::Live);
    assert_eq!(settings.probe_headroom, civic_core::DEFAULT_PROBE_HEADROOM);

    clear_civic_env();
}

#[test]
fn unparsable_yaml_uses_defaults() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|err| err.into_inner());
    clear_civic_env();
    let path = write_config("database: [not, a, map\n");

    let settings = Settings::from_config_path(&path);
    assert!(settings.db_url.is_none());
    assert_eq!(settings.db_pool_max, DEFAULT_DB_POOL_MAX);
}

#[test]
fn zero_pool_max_in_yaml_falls_back() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|err| err.into_inner());
    clear_civic_env();
    let path = write_config("database:\n  pool_max: 0\n");

    let settings = Settings::from_config_path(&path);
    assert_eq!(settings.db_pool_max, DEFAULT_DB_POOL_MAX);
}

#[test]
fn backfill_options_prefer_flag_over_settings() {
    let settings = Settings {
        db_url: None,
        db_pool_max: 1,
        probe_mode: ProbeMode::Snapshot,
        probe_headroom: 7,
    };

    let options = settings.backfill_options(true, None);
    assert!(options.dry_run);
    assert_eq!(options.probe_mode, ProbeMode::Snapshot);
    assert_eq!(options.probe_headroom, 7);

    let options = settings.backfill_options(false, Some(ProbeMode::Live));
    assert!(!options.dry_run);
    assert_eq!(options.probe_mode, ProbeMode::Live);
}

#[test]
fn blank_database_url_is_rejected() {
    let settings = Settings {
        db_url: Some("   ".to_string()),
        db_pool_max: 1,
        probe_mode: ProbeMode::Live,
        probe_headroom: 0,
    };
    assert!(settings.database_url().is_err());
}
