use anyhow::Context;
use civic_core::{audit_identifiers, AuditReport};

use crate::cli_args::AuditArgs;
use crate::modules::system::{connect, print_json};
use crate::settings::Settings;

pub(crate) async fn handle_audit(args: AuditArgs, settings: &Settings) -> anyhow::Result<()> {
    let db = connect(settings).await?;
    let users = db.users();
    let result = audit_identifiers(users.as_ref()).await;
    drop(users);
    db.close().await;

    let report = result.context("audit failed")?;
    if args.json {
        print_json(&report)?;
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &AuditReport) {
    println!(
        "users={} pending={} unique={}",
        report.total,
        report.pending,
        report.is_unique()
    );
    for (reason, count) in &report.skipped {
        println!("skipped  {reason}: {count}");
    }
    for group in &report.duplicates {
        println!("duplicate  {} x{}", group.custom_id, group.count);
    }
}
