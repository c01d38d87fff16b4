use civic_core::ProbeMode;
use clap::Args;

#[derive(Args)]
pub struct BackfillArgs {
    #[arg(long, help = "Report planned renames without writing")]
    pub dry_run: bool,
    #[arg(long, help = "Collision check strategy: live or snapshot")]
    pub probe: Option<ProbeMode>,
    #[arg(long)]
    pub json: bool,
}
