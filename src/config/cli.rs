use clap::Parser;

/// Every flag is optional; a bare invocation performs one sync run configured
/// from the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "ptv-sync")]
#[command(about = "Synchronize regional PTV services and channels into MongoDB")]
pub struct CliArgs {
    /// Read configuration from a TOML file instead of the environment
    #[arg(long)]
    pub config: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Run against an in-memory store, leaving the database untouched
    #[arg(long)]
    pub dry_run: bool,
}
