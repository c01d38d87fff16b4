use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

pub use crate::modules::audit::args::*;
pub use crate::modules::backfill::args::*;

#[derive(Parser)]
#[command(name = "civic-admin")]
#[command(about = "Civic maintenance CLI")]
pub struct Cli {
    #[arg(long, help = "Database URL (postgres://... or sqlite://...)")]
    pub db_url: Option<String>,
    #[arg(long, help = "YAML settings file (overrides CIVIC_CONFIG_PATH)")]
    pub config: Option<PathBuf>,
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Apply schema migrations
    Migrate,
    /// Append gender tokens to user identifiers
    Backfill(BackfillArgs),
    /// Check identifier uniqueness and pending renames
    Audit(AuditArgs),
}
