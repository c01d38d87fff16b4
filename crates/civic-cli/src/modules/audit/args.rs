use clap::Args;

#[derive(Args)]
pub struct AuditArgs {
    #[arg(long)]
    pub json: bool,
}
