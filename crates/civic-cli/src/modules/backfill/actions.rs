use anyhow::Context;
use civic_core::{Backfill, BackfillReport, OutcomeStatus, StopFlag};

use crate::cli_args::BackfillArgs;
use crate::modules::system::{connect, print_json, stop_on_ctrl_c};
use crate::settings::Settings;

pub(crate) async fn handle_backfill(args: BackfillArgs, settings: &Settings) -> anyhow::Result<()> {
    let db = connect(settings).await?;
    let options = settings.backfill_options(args.dry_run, args.probe);

    let stop = StopFlag::new();
    let watcher = stop_on_ctrl_c(stop.clone());
    let users = db.users();
    let result = Backfill::new(users.as_ref(), options)
        .with_stop_flag(stop)
        .run()
        .await;
    watcher.abort();
    drop(users);
    db.close().await;

    let report = result.context("backfill could not start")?;
    if args.json {
        print_json(&report)?;
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &BackfillReport) {
    let mode = if report.dry_run { "dry run" } else { "applied" };
    println!(
        "backfill {mode}: candidates={} updated={} planned={} skipped={} failed={}",
        report.candidates, report.updated, report.planned, report.skipped, report.failed
    );
    if report.interrupted {
        println!("interrupted before all candidates were processed");
    }
    for outcome in &report.outcomes {
        let new_custom_id = outcome.new_custom_id.as_deref().unwrap_or("-");
        match &outcome.status {
            OutcomeStatus::Updated => {
                println!("updated  {} {} -> {}", outcome.id, outcome.old_custom_id, new_custom_id);
            }
            OutcomeStatus::Planned => {
                println!("planned  {} {} -> {}", outcome.id, outcome.old_custom_id, new_custom_id);
            }
            OutcomeStatus::Skipped { reason } => {
                println!("skipped  {} {} ({reason})", outcome.id, outcome.old_custom_id);
            }
            OutcomeStatus::Failed { error } => {
                println!("failed   {} {} ({error})", outcome.id, outcome.old_custom_id);
            }
        }
    }
}
