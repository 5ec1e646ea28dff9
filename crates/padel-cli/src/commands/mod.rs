//! Subcommand implementations.

mod configure;
mod get;
mod list;
mod options;
mod put;
mod search;
mod watch;

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use tokio::sync::mpsc;

use padel_core::sync::{ListContext, Notice};
use padel_core::{DynRecord, EntityName, ListSynchronizer, LoadOutcome};

use crate::cli::GlobalArgs;
use crate::settings::{CliBackend, Settings};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Save backend, token and list defaults
    Configure(configure::ConfigureArgs),

    /// List records page by page
    List(list::ListArgs),

    /// Search a collection
    Search(search::SearchArgs),

    /// Fetch a single record
    Get(get::GetArgs),

    /// Print id/label pairs for selector inputs
    Options(options::OptionsArgs),

    /// Create a record, or update one with --id
    Put(put::PutArgs),

    /// Show a list and apply live updates as they arrive
    Watch(watch::WatchArgs),
}

pub async fn handle(global: GlobalArgs, command: Command) -> Result<()> {
    match command {
        Command::Configure(args) => configure::run(&global, args),
        Command::List(args) => list::run(&global, args).await,
        Command::Search(args) => search::run(&global, args).await,
        Command::Get(args) => get::run(&global, args).await,
        Command::Options(args) => options::run(&global, args).await,
        Command::Put(args) => put::run(&global, args).await,
        Command::Watch(args) => watch::run(&global, args).await,
    }
}

fn parse_entity(name: &str) -> Result<EntityName> {
    EntityName::new(name).context("Invalid entity name")
}

fn connect(global: &GlobalArgs) -> Result<(Settings, CliBackend)> {
    let settings = Settings::resolve(global)?;
    let backend = CliBackend::connect(&settings)?;
    Ok((settings, backend))
}

type Synchronizer = ListSynchronizer<DynRecord, CliBackend>;

/// Mount a list whose failure notices are collected for the caller.
fn mount(
    global: &GlobalArgs,
    entity: EntityName,
) -> Result<(Synchronizer, mpsc::UnboundedReceiver<Notice>)> {
    let (settings, backend) = connect(global)?;
    let (tx, rx) = mpsc::unbounded_channel();
    let context = ListContext::new(settings.sync).with_notifier(tx);
    let sync = ListSynchronizer::mount(backend, entity, context).context("Invalid list settings")?;
    Ok((sync, rx))
}

/// Turn a failed load into an error carrying the notice text.
fn ensure_loaded(outcome: LoadOutcome, notices: &mut mpsc::UnboundedReceiver<Notice>) -> Result<()> {
    if outcome == LoadOutcome::Failed {
        let message = notices
            .try_recv()
            .map(|n| n.message)
            .unwrap_or_else(|_| "Request failed".to_string());
        bail!(message);
    }
    Ok(())
}
