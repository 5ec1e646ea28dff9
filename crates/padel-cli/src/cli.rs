//! CLI argument definitions.

use clap::{Args, Parser};

use crate::commands::Command;

/// Browse, search and watch the padel admin backend.
#[derive(Parser, Debug)]
#[command(name = "padel")]
#[command(author, version = env!("PADEL_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Connection overrides. Unset values fall back to the saved configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Backend base URL (https://..., or file:///path for a local store)
    #[arg(long, env = "PADEL_BACKEND", global = true)]
    pub backend: Option<String>,

    /// Bearer token sent with every request
    #[arg(long, env = "PADEL_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Records per page
    #[arg(long, global = true)]
    pub page_size: Option<u64>,
}
