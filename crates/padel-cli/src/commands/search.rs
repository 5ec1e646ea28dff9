//! Search command implementation.

use anyhow::Result;
use clap::Args;

use super::{ensure_loaded, mount, parse_entity};
use crate::cli::GlobalArgs;
use crate::output;

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Entity collection to search
    pub entity: String,

    /// Text the backend matches against the collection
    pub query: String,

    /// Pretty-print each record
    #[arg(long)]
    pub pretty: bool,
}

pub async fn run(global: &GlobalArgs, args: SearchArgs) -> Result<()> {
    let entity = parse_entity(&args.entity)?;
    let (sync, mut notices) = mount(global, entity)?;

    ensure_loaded(sync.search(&args.query).await, &mut notices)?;

    let view = sync.view();
    for record in &view.items {
        output::record(record, args.pretty)?;
    }
    output::status(&format!(
        "{} results for '{}'",
        view.items.len(),
        args.query
    ));

    sync.unmount();
    Ok(())
}
