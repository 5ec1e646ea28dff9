//! Options command implementation.
//!
//! Prints the `id<TAB>label` pairs a selector input offers, e.g. the roles
//! a user form can pick from.

use anyhow::Result;
use clap::Args;

use padel_core::{DynRecord, Gateway};

use super::{connect, parse_entity};
use crate::cli::GlobalArgs;

#[derive(Args, Debug)]
pub struct OptionsArgs {
    /// Entity collection
    pub entity: String,

    /// Field shown as the option label
    #[arg(long, default_value = "name")]
    pub label: String,
}

pub async fn run(global: &GlobalArgs, args: OptionsArgs) -> Result<()> {
    let entity = parse_entity(&args.entity)?;
    let (_, backend) = connect(global)?;

    let records: Vec<DynRecord> = backend
        .fetch_all(&entity)
        .await
        .map_err(|e| anyhow::anyhow!(e.summary()))?;

    for record in &records {
        println!("{}\t{}", record.id, label(record, &args.label));
    }
    Ok(())
}

fn label(record: &DynRecord, field: &str) -> String {
    match record.field(field) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Null) | None => record.id.to_string(),
        Some(other) => other.to_string(),
    }
}
