//! Configure command implementation.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use padel_core::BackendUrl;
use padel_core::sync::{ApplyOrder, InsertPosition, PushPolicy};

use crate::cli::GlobalArgs;
use crate::output;
use crate::settings::storage::{self, StoredConfig};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PushPolicyArg {
    /// Leave search mode when a live update arrives
    ResetSearch,
    /// Keep search results on screen and patch matching rows
    Isolated,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum InsertPositionArg {
    Back,
    Front,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ApplyOrderArg {
    /// Merge pages in the order their responses arrive
    AsResolved,
    /// Drop pages that resolve after a newer one was applied
    Sequenced,
}

#[derive(Args, Debug)]
pub struct ConfigureArgs {
    /// How live updates interact with an active search
    #[arg(long, value_enum)]
    pub push_policy: Option<PushPolicyArg>,

    /// Where records first seen through a live update are placed
    #[arg(long, value_enum)]
    pub insert_position: Option<InsertPositionArg>,

    /// How page responses that arrive out of order are merged
    #[arg(long, value_enum)]
    pub apply_order: Option<ApplyOrderArg>,
}

pub fn run(global: &GlobalArgs, args: ConfigureArgs) -> Result<()> {
    let backend = global
        .backend
        .as_deref()
        .context("--backend is required")?;
    let backend = BackendUrl::new(backend).context("Invalid backend URL")?;

    let config = StoredConfig {
        backend: Some(backend.to_string()),
        token: global.token.clone(),
        page_size: global.page_size,
        push_policy: args.push_policy.map(|p| match p {
            PushPolicyArg::ResetSearch => PushPolicy::ResetSearch,
            PushPolicyArg::Isolated => PushPolicy::Isolated,
        }),
        insert_position: args.insert_position.map(|p| match p {
            InsertPositionArg::Back => InsertPosition::Back,
            InsertPositionArg::Front => InsertPosition::Front,
        }),
        apply_order: args.apply_order.map(|o| match o {
            ApplyOrderArg::AsResolved => ApplyOrder::AsResolved,
            ApplyOrderArg::Sequenced => ApplyOrder::Sequenced,
        }),
    };

    let path = storage::save_config(&config).context("Failed to save configuration")?;

    output::success("Configuration saved");
    println!();
    output::field("Backend", backend.as_str());
    output::field("Token", if config.token.is_some() { "set" } else { "not set" });
    output::field("Path", &path.display().to_string());

    Ok(())
}
