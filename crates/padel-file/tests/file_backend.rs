//! End-to-end tests of the synchronizer over the file backend.

use std::time::Duration;

use futures_util::StreamExt;
use padel_core::sync::{ListContext, LoadOutcome, SyncConfig};
use padel_core::{DynRecord, EntityName, Gateway, ListSynchronizer, PushChannel, User};
use padel_file::FileGateway;
use serde_json::json;
use tempfile::TempDir;

fn seeded(entity: &EntityName, count: usize) -> (TempDir, FileGateway) {
    let dir = TempDir::new().unwrap();
    let gateway = FileGateway::new(dir.path());
    for i in 0..count {
        gateway
            .store()
            .create(
                entity,
                &json!({"_id": format!("u{:03}", i), "nickname": format!("player{}", i), "role": "r1"}),
            )
            .unwrap();
    }
    (dir, gateway)
}

async fn eventually(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn test_pages_through_directory() {
    let users = EntityName::user();
    let (_dir, gateway) = seeded(&users, 40);

    let sync: ListSynchronizer<User, _> =
        ListSynchronizer::mount(gateway, users, ListContext::default()).unwrap();

    assert_eq!(sync.load_first().await, LoadOutcome::Applied { added: 25 });
    assert_eq!(sync.trigger_load_more().await, LoadOutcome::Applied { added: 15 });
    assert_eq!(sync.trigger_load_more().await, LoadOutcome::Skipped);

    let items = sync.paged_items();
    assert_eq!(items.first().unwrap().fields.nickname, "player0");
    assert_eq!(items.last().unwrap().id.as_str(), "u039");
}

#[tokio::test]
async fn test_search_over_directory() {
    let users = EntityName::user();
    let (_dir, gateway) = seeded(&users, 12);

    let sync: ListSynchronizer<DynRecord, _> =
        ListSynchronizer::mount(gateway, users, ListContext::default()).unwrap();
    sync.load_first().await;

    assert_eq!(sync.search("PLAYER1").await, LoadOutcome::Applied { added: 3 });
    let view = sync.view();
    let ids: Vec<_> = view.items.iter().map(|r| r.id.as_str().to_string()).collect();
    assert_eq!(ids, vec!["u001", "u010", "u011"]);

    sync.search("").await;
    assert_eq!(sync.view().items.len(), 12);
}

#[tokio::test]
async fn test_push_channel_sees_only_new_writes() {
    let sales = EntityName::sale();
    let (_dir, gateway) = seeded(&EntityName::user(), 0);
    gateway.store().create(&sales, &json!({"_id": "old", "total": 1})).unwrap();

    let channel = gateway.push_channel();
    let mut stream = PushChannel::<DynRecord>::subscribe(&channel, &sales).unwrap();

    gateway.store().create(&EntityName::user(), &json!({"_id": "x", "nickname": "x", "role": "r"})).unwrap();
    let created: DynRecord = gateway.create(&sales, &json!({"total": 99})).await.unwrap();

    let event = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(event.entity, sales);
    assert_eq!(event.record.id, created.id);
}

#[tokio::test]
async fn test_live_updates_reach_synchronizer() {
    let sales = EntityName::sale();
    let (_dir, gateway) = seeded(&sales, 0);
    for id in ["a", "b", "c"] {
        gateway.store().create(&sales, &json!({"_id": id, "total": 1})).unwrap();
    }

    let sync: ListSynchronizer<DynRecord, _> = ListSynchronizer::mount(
        gateway.clone(),
        sales.clone(),
        ListContext::new(SyncConfig::default()),
    )
    .unwrap();
    sync.load_first().await;
    let _subscription = sync.attach_push(&gateway.push_channel()).unwrap();

    let id = padel_core::RecordId::new("a").unwrap();
    let _: DynRecord = gateway.update(&sales, &id, &json!({"total": 150})).await.unwrap();
    let _: DynRecord = gateway.create(&sales, &json!({"_id": "d", "total": 5})).await.unwrap();

    eventually(|| sync.len() == 4).await;
    let items = sync.paged_items();
    assert_eq!(items[0].field("total"), Some(&json!(150)));
    assert_eq!(items[3].id.as_str(), "d");
}
