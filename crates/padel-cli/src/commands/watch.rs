//! Watch command implementation.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use clap::Args;
use colored::Colorize;
use tokio::time::Instant;

use padel_core::sync::{Notice, NoticeLevel};
use padel_core::{DynRecord, RecordId};

use super::{ensure_loaded, mount, parse_entity};
use crate::cli::GlobalArgs;
use crate::output;

const REFRESH_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Entity collection to watch
    pub entity: String,

    /// Print changed records as JSON lines
    #[arg(long)]
    pub json: bool,

    /// Stop after this many seconds
    #[arg(long = "for", value_name = "SECS")]
    pub duration: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Insert,
    Update,
}

pub async fn run(global: &GlobalArgs, args: WatchArgs) -> Result<()> {
    let entity = parse_entity(&args.entity)?;
    let (sync, mut notices) = mount(global, entity.clone())?;

    ensure_loaded(sync.load_first().await, &mut notices)?;
    let subscription = sync.attach_push(sync.gateway())?;

    let mut known = snapshot(&sync.paged_items());
    output::status(&format!(
        "Watching {} ({} of {} loaded). Press Ctrl+C to stop.",
        entity,
        known.len(),
        sync.total()
    ));

    let deadline = args.duration.map(|secs| Instant::now() + Duration::from_secs(secs));
    let mut interval = tokio::time::interval(REFRESH_INTERVAL);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = sleep_until(deadline) => break,
            Some(notice) = notices.recv() => print_notice(&notice),
            _ = interval.tick() => {
                let items = sync.paged_items();
                for (change, record) in diff(&known, &items) {
                    print_change(change, record, args.json)?;
                }
                known = snapshot(&items);
            }
        }
    }

    subscription.close();
    sync.unmount();
    output::status("Stopped");
    Ok(())
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn snapshot(items: &[DynRecord]) -> HashMap<RecordId, DynRecord> {
    items.iter().map(|r| (r.id.clone(), r.clone())).collect()
}

fn diff<'a>(
    known: &HashMap<RecordId, DynRecord>,
    items: &'a [DynRecord],
) -> Vec<(Change, &'a DynRecord)> {
    items
        .iter()
        .filter_map(|record| match known.get(&record.id) {
            None => Some((Change::Insert, record)),
            Some(previous) if previous != record => Some((Change::Update, record)),
            Some(_) => None,
        })
        .collect()
}

fn print_change(change: Change, record: &DynRecord, json: bool) -> Result<()> {
    if json {
        return output::record(record, false);
    }

    let time = Local::now().format("%H:%M:%S");
    let label = match change {
        Change::Insert => "INSERT".green(),
        Change::Update => "UPDATE".yellow(),
    };
    let fields = serde_json::to_string(&record.fields)?;
    println!("{} {} {} {}", time.to_string().dimmed(), label, record.id, fields);
    Ok(())
}

fn print_notice(notice: &Notice) {
    match notice.level {
        NoticeLevel::Error => output::error(&notice.message),
        NoticeLevel::Info => output::status(&notice.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> DynRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn diff_reports_inserts_and_updates() {
        let before = vec![
            record(json!({"_id": "a", "total": 1})),
            record(json!({"_id": "b", "total": 2})),
        ];
        let after = vec![
            record(json!({"_id": "a", "total": 150})),
            record(json!({"_id": "b", "total": 2})),
            record(json!({"_id": "c", "total": 3})),
        ];

        let changes: Vec<_> = diff(&snapshot(&before), &after)
            .into_iter()
            .map(|(change, r)| (change, r.id.as_str().to_string()))
            .collect();
        assert_eq!(
            changes,
            vec![
                (Change::Update, "a".to_string()),
                (Change::Insert, "c".to_string())
            ]
        );
    }
}
