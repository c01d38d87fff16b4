use assert_cmd::Command;
use civic_core::UserRecord;
use civic_db::local::LocalUserRepo;
use civic_db::{connect_sqlite_with_max, migrate_local};
use predicates::prelude::*;
use std::path::Path;
use tempfile::{tempdir, TempDir};

fn base_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("civic-admin"));
    cmd.env("CIVIC_CONFIG_PATH", home.join("missing.yaml"))
        .env_remove("CIVIC_DB_URL")
        .env_remove("CIVIC_PROBE_MODE")
        .env_remove("RUST_LOG")
        .env_remove("LOG_FORMAT");
    cmd
}

fn db_url(dir: &TempDir) -> String {
    format!("sqlite://{}", dir.path().join("civic.sqlite").display())
}

fn seed(url: &str, users: &[(&str, Option<&str>)]) {
    let runtime = tokio::runtime::Runtime::new().expect("runtime");
    runtime.block_on(async {
        let pool = connect_sqlite_with_max(url, 1).await.expect("sqlite");
        migrate_local(&pool).await.expect("migrate");
        let repo = LocalUserRepo::new(&pool);
        for (custom_id, gender) in users {
            repo.create(&UserRecord::new(*custom_id, *gender))
                .await
                .expect("create user");
        }
        pool.close().await;
    });
}

fn stored_custom_ids(url: &str) -> Vec<String> {
    let runtime = tokio::runtime::Runtime::new().expect("runtime");
    runtime.block_on(async {
        let pool = connect_sqlite_with_max(url, 1).await.expect("sqlite");
        let mut ids = LocalUserRepo::new(&pool)
            .all_custom_ids()
            .await
            .expect("custom ids");
        pool.close().await;
        ids.sort();
        ids
    })
}

#[test]
fn migrate_then_backfill_empty_database() {
    let dir = tempdir().expect("tempdir");
    let url = db_url(&dir);

    base_cmd(dir.path())
        .args(["--db-url", &url, "migrate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("migrations applied (sqlite)"));

    base_cmd(dir.path())
        .args(["--db-url", &url, "backfill"])
        .assert()
        .success()
        .stdout(predicate::str::contains("candidates=0 updated=0"));
}

#[test]
fn backfill_resolves_collisions_and_reports_json() {
    let dir = tempdir().expect("tempdir");
    let url = db_url(&dir);
    seed(&url, &[("U100", Some("M")), ("U100M", Some("F")), ("U300", Some(""))]);

    let output = base_cmd(dir.path())
        .env("CIVIC_DB_URL", &url)
        .args(["backfill", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report: serde_json::Value = serde_json::from_slice(&output).expect("json report");
    assert_eq!(report["updated"], 1);
    assert_eq!(report["skipped"], 1);
    assert_eq!(report["failed"], 0);
    assert_eq!(report["dry_run"], false);

    assert_eq!(stored_custom_ids(&url), vec!["U100M", "U100M1", "U300"]);

    base_cmd(dir.path())
        .env("CIVIC_DB_URL", &url)
        .arg("backfill")
        .assert()
        .success()
        .stdout(predicate::str::contains("updated=0"));
}

#[test]
fn dry_run_prints_plan_without_writing() {
    let dir = tempdir().expect("tempdir");
    let url = db_url(&dir);
    seed(&url, &[("A1", Some("female")), ("A1F", Some("F"))]);

    base_cmd(dir.path())
        .args(["--db-url", &url, "backfill", "--dry-run", "--probe", "snapshot"])
        .assert()
        .success()
        .stdout(predicate::str::contains("backfill dry run"))
        .stdout(predicate::str::contains("A1 -> A1F1"));

    assert_eq!(stored_custom_ids(&url), vec!["A1", "A1F"]);
}

#[test]
fn audit_reports_pending_records() {
    let dir = tempdir().expect("tempdir");
    let url = db_url(&dir);
    seed(&url, &[("U1", Some("M")), ("U2F", Some("F")), ("U3", Some("x"))]);

    let output = base_cmd(dir.path())
        .args(["--db-url", &url, "audit", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report: serde_json::Value = serde_json::from_slice(&output).expect("json report");
    assert_eq!(report["total"], 3);
    assert_eq!(report["pending"], 1);
    assert_eq!(report["duplicates"], serde_json::json!([]));
}

#[test]
fn config_file_supplies_database_url() {
    let dir = tempdir().expect("tempdir");
    let url = db_url(&dir);
    seed(&url, &[("U1", Some("M"))]);
    let config_path = dir.path().join("civic.yaml");
    std::fs::write(&config_path, format!("database:\n  url: {url}\n")).expect("config");

    base_cmd(dir.path())
        .arg("--config")
        .arg(&config_path)
        .arg("backfill")
        .assert()
        .success()
        .stdout(predicate::str::contains("U1 -> U1M"));
}

#[test]
fn missing_database_url_fails() {
    let dir = tempdir().expect("tempdir");

    base_cmd(dir.path())
        .arg("backfill")
        .assert()
        .failure()
        .stderr(predicate::str::contains("database url not set"));
}

#[test]
fn missing_config_file_fails() {
    let dir = tempdir().expect("tempdir");

    base_cmd(dir.path())
        .args(["--config", "/nonexistent/civic.yaml", "audit"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn unsupported_scheme_fails_before_running() {
    let dir = tempdir().expect("tempdir");

    base_cmd(dir.path())
        .args(["--db-url", "mongodb://127.0.0.1/civic", "backfill"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported_database_url"));
}

#[test]
fn unreachable_sqlite_path_fails() {
    let dir = tempdir().expect("tempdir");
    let url = format!(
        "sqlite://{}",
        dir.path().join("missing-dir").join("civic.sqlite").display()
    );

    base_cmd(dir.path())
        .args(["--db-url", &url, "backfill"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to connect to database"));
}
