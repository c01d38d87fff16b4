use crate::cli_args::*;
use crate::modules::audit::handle_audit;
use crate::modules::backfill::handle_backfill;
use crate::modules::system::handle_migrate;
use crate::settings::Settings;

pub(crate) async fn handle_command(command: Command, settings: &Settings) -> anyhow::Result<()> {
    match command {
        Command::Migrate => handle_migrate(settings).await?,
        Command::Backfill(args) => handle_backfill(args, settings).await?,
        Command::Audit(args) => handle_audit(args, settings).await?,
    }

    Ok(())
}
