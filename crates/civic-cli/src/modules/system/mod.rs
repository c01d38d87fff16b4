use anyhow::Context;
use civic_core::StopFlag;
use civic_db::Database;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::settings::Settings;

pub(crate) async fn connect(settings: &Settings) -> anyhow::Result<Database> {
    let url = settings.database_url()?;
    Database::connect(url, settings.db_pool_max)
        .await
        .context("failed to connect to database")
}

pub(crate) async fn handle_migrate(settings: &Settings) -> anyhow::Result<()> {
    let db = connect(settings).await?;
    let result = db.migrate().await.context("failed to apply migrations");
    db.close().await;
    result?;
    info!(event = "migrations_applied", backend = db.backend().as_str());
    println!("migrations applied ({})", db.backend().as_str());
    Ok(())
}

/// Requests a stop on Ctrl-C. Abort the handle once the run is over.
pub(crate) fn stop_on_ctrl_c(stop: StopFlag) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!(
                event = "stop_requested",
                "Stop requested; finishing the current record"
            );
            stop.stop();
        }
    })
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let body = serde_json::to_string_pretty(value)?;
    println!("{body}");
    Ok(())
}
