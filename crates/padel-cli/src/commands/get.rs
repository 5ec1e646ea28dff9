//! Get command implementation.

use anyhow::{Context, Result};
use clap::Args;

use padel_core::{DynRecord, Gateway, RecordId};

use super::{connect, parse_entity};
use crate::cli::GlobalArgs;
use crate::output;

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Entity collection
    pub entity: String,

    /// Record id
    pub id: String,

    /// Print compact JSON instead of pretty JSON
    #[arg(long)]
    pub compact: bool,
}

pub async fn run(global: &GlobalArgs, args: GetArgs) -> Result<()> {
    let entity = parse_entity(&args.entity)?;
    let id = RecordId::new(&args.id).context("Invalid record id")?;
    let (_, backend) = connect(global)?;

    let record: DynRecord = backend
        .fetch_one(&entity, &id)
        .await
        .map_err(|e| anyhow::anyhow!(e.summary()))?;

    output::record(&record, !args.compact)
}
