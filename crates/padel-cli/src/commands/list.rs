//! List command implementation.

use anyhow::Result;
use clap::Args;

use padel_core::LoadOutcome;

use super::{ensure_loaded, mount, parse_entity};
use crate::cli::GlobalArgs;
use crate::output;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Entity collection (sale, user, role, product, ...)
    pub entity: String,

    /// Number of pages to load
    #[arg(long, default_value_t = 1, conflicts_with = "all")]
    pub pages: u32,

    /// Keep loading until the collection is exhausted
    #[arg(long)]
    pub all: bool,

    /// Pretty-print each record
    #[arg(long)]
    pub pretty: bool,
}

pub async fn run(global: &GlobalArgs, args: ListArgs) -> Result<()> {
    let entity = parse_entity(&args.entity)?;
    let (sync, mut notices) = mount(global, entity.clone())?;

    ensure_loaded(sync.load_first().await, &mut notices)?;

    let mut loaded = 1;
    while args.all || loaded < args.pages {
        match sync.trigger_load_more().await {
            LoadOutcome::Applied { .. } => loaded += 1,
            LoadOutcome::Skipped => break,
            outcome => {
                ensure_loaded(outcome, &mut notices)?;
                break;
            }
        }
    }

    let view = sync.view();
    for record in &view.items {
        output::record(record, args.pretty)?;
    }

    output::status(&format!(
        "Showing {} of {} {} records",
        view.items.len(),
        view.total,
        entity
    ));
    if view.has_more {
        output::status("More available: pass --pages or --all");
    }

    sync.unmount();
    Ok(())
}
