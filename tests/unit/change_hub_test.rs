//! Unit tests for the in-process change feed and the publishing store wrapper.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;

use smartmarks::database::Database;
use smartmarks::managers::bookmark_manager::{BookmarkManager, BookmarkStore};
use smartmarks::managers::change_hub::{ChangeHub, ChangeStream, PublishingStore};
use smartmarks::types::bookmark::{Bookmark, BookmarkChanges, NewBookmark, BOOKMARKS_TABLE};
use smartmarks::types::change::{ChangeEvent, ChangeFeed, ChangeKind, EventFilter};
use smartmarks::types::errors::{RemoteError, SubscriptionError};

fn bookmark(id: &str) -> Bookmark {
    Bookmark {
        id: id.to_string(),
        title: format!("Title {}", id),
        url: format!("https://{}.example", id),
        created_at: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
        owner: "user-1".to_string(),
    }
}

fn feed() -> ChangeFeed {
    ChangeFeed::default()
}

#[test]
fn test_subscriber_receives_published_events_in_order() {
    let hub = ChangeHub::new(16);
    let mut sub = hub.subscribe(&feed()).unwrap();

    assert_eq!(hub.publish(BOOKMARKS_TABLE, ChangeEvent::Insert(bookmark("a"))), 1);
    hub.publish(BOOKMARKS_TABLE, ChangeEvent::Delete { id: "a".to_string() });

    assert_eq!(sub.try_next(), Some(ChangeEvent::Insert(bookmark("a"))));
    assert_eq!(sub.try_next(), Some(ChangeEvent::Delete { id: "a".to_string() }));
    assert_eq!(sub.try_next(), None);
}

#[test]
fn test_publish_without_subscribers_is_harmless() {
    let hub = ChangeHub::new(4);
    assert_eq!(hub.publish(BOOKMARKS_TABLE, ChangeEvent::Insert(bookmark("a"))), 0);
}

#[test]
fn test_events_for_other_tables_are_skipped() {
    let hub = ChangeHub::new(16);
    let mut sub = hub.subscribe(&feed()).unwrap();

    hub.publish("tags", ChangeEvent::Insert(bookmark("t")));
    hub.publish(BOOKMARKS_TABLE, ChangeEvent::Insert(bookmark("b")));

    assert_eq!(sub.try_next(), Some(ChangeEvent::Insert(bookmark("b"))));
    assert_eq!(sub.try_next(), None);
}

#[test]
fn test_event_filter_restricts_kinds() {
    let hub = ChangeHub::new(16);
    let mut deletes_only = hub
        .subscribe(&ChangeFeed::new("deletes", BOOKMARKS_TABLE, EventFilter::Delete))
        .unwrap();

    hub.publish(BOOKMARKS_TABLE, ChangeEvent::Insert(bookmark("a")));
    hub.publish(BOOKMARKS_TABLE, ChangeEvent::Delete { id: "a".to_string() });

    let event = deletes_only.try_next().unwrap();
    assert_eq!(event.kind(), ChangeKind::Delete);
    assert_eq!(deletes_only.try_next(), None);
}

#[test]
fn test_event_filter_matches() {
    assert!(EventFilter::All.matches(ChangeKind::Update));
    assert!(EventFilter::Insert.matches(ChangeKind::Insert));
    assert!(!EventFilter::Insert.matches(ChangeKind::Delete));
    assert!(!EventFilter::Update.matches(ChangeKind::Insert));
}

#[test]
fn test_invalid_feed_is_rejected() {
    let hub = ChangeHub::new(4);

    let err = hub
        .subscribe(&ChangeFeed::new("  ", BOOKMARKS_TABLE, EventFilter::All))
        .err()
        .unwrap();
    assert!(matches!(err, SubscriptionError::InvalidFeed(_)));

    let err = hub
        .subscribe(&ChangeFeed::new("realtime bookmarks", "", EventFilter::All))
        .err()
        .unwrap();
    assert!(matches!(err, SubscriptionError::InvalidFeed(_)));
    assert_eq!(hub.active_subscriptions(), 0);
}

#[test]
fn test_unsubscribe_and_drop_release_subscriptions() {
    let hub = ChangeHub::new(4);
    let first = hub.subscribe(&feed()).unwrap();
    let second = hub.subscribe(&feed()).unwrap();
    assert_eq!(hub.active_subscriptions(), 2);

    first.unsubscribe();
    assert_eq!(hub.active_subscriptions(), 1);

    drop(second);
    assert_eq!(hub.active_subscriptions(), 0);
}

#[test]
fn test_lagging_subscriber_counts_missed_events() {
    let hub = ChangeHub::new(2);
    let mut sub = hub.subscribe(&feed()).unwrap();

    for id in ["a", "b", "c", "d", "e"] {
        hub.publish(BOOKMARKS_TABLE, ChangeEvent::Insert(bookmark(id)));
    }

    assert_eq!(sub.try_next(), Some(ChangeEvent::Insert(bookmark("d"))));
    assert_eq!(sub.try_next(), Some(ChangeEvent::Insert(bookmark("e"))));
    assert_eq!(sub.try_next(), None);
    assert_eq!(sub.missed_events(), 3);
}

#[tokio::test]
async fn test_next_waits_for_event() {
    let hub = ChangeHub::new(4);
    let mut sub = hub.subscribe(&feed()).unwrap();

    let publisher = hub.clone();
    tokio::spawn(async move {
        publisher.publish(BOOKMARKS_TABLE, ChangeEvent::Insert(bookmark("late")));
    });

    assert_eq!(sub.next().await, Some(ChangeEvent::Insert(bookmark("late"))));
}

#[tokio::test]
async fn test_next_returns_none_when_hub_is_gone() {
    let hub = ChangeHub::new(4);
    let mut sub = hub.subscribe(&feed()).unwrap();
    drop(hub);

    assert_eq!(sub.next().await, None);
}

#[tokio::test]
async fn test_publishing_store_emits_change_per_write() {
    let hub = ChangeHub::new(16);
    let db = Database::open_in_memory().unwrap();
    let store = Arc::new(PublishingStore::new(BookmarkManager::new(db), hub.clone(), BOOKMARKS_TABLE));
    let mut sub = hub.subscribe(&feed()).unwrap();

    let stored = store
        .insert(NewBookmark {
            title: "Rust".to_string(),
            url: "https://rust-lang.org".to_string(),
            owner: "user-1".to_string(),
        })
        .await
        .unwrap();
    let updated = store
        .update(
            &stored.id,
            BookmarkChanges {
                title: Some("Rust Lang".to_string()),
                url: None,
            },
        )
        .await
        .unwrap();
    store.delete(&stored.id).await.unwrap();

    assert_eq!(sub.try_next(), Some(ChangeEvent::Insert(stored.clone())));
    assert_eq!(
        sub.try_next(),
        Some(ChangeEvent::Update {
            old_id: Some(stored.id.clone()),
            record: updated,
        })
    );
    assert_eq!(sub.try_next(), Some(ChangeEvent::Delete { id: stored.id }));
    assert_eq!(sub.try_next(), None);
}

#[tokio::test]
async fn test_failed_write_publishes_nothing() {
    let hub = ChangeHub::new(16);
    let db = Database::open_in_memory().unwrap();
    let store = PublishingStore::new(BookmarkManager::new(db), hub.clone(), BOOKMARKS_TABLE);
    let mut sub = hub.subscribe(&feed()).unwrap();

    assert!(store.update("missing", BookmarkChanges::default()).await.is_err());
    assert_eq!(sub.try_next(), None);
}

// ─── Upstream payloads ───

#[test]
fn test_payload_is_decoded_and_published() {
    let hub = ChangeHub::new(16);
    let mut sub = hub.subscribe(&feed()).unwrap();

    let delivered = hub
        .publish_payload(BOOKMARKS_TABLE, &json!({"eventType": "DELETE", "old": {"id": "a"}}))
        .unwrap();

    assert_eq!(delivered, 1);
    assert_eq!(sub.try_next(), Some(ChangeEvent::Delete { id: "a".to_string() }));
}

#[test]
fn test_payload_table_overrides_default() {
    let hub = ChangeHub::new(16);
    let mut sub = hub.subscribe(&feed()).unwrap();

    hub.publish_payload(
        BOOKMARKS_TABLE,
        &json!({"eventType": "DELETE", "table": "tags", "old": {"id": "t"}}),
    )
    .unwrap();

    assert_eq!(sub.try_next(), None);
}

#[test]
fn test_undecodable_payload_publishes_nothing() {
    let hub = ChangeHub::new(16);
    let mut sub = hub.subscribe(&feed()).unwrap();

    let err = hub.publish_payload(BOOKMARKS_TABLE, &json!({"new": {}})).unwrap_err();

    assert!(matches!(err, RemoteError::Decode(_)));
    assert_eq!(sub.try_next(), None);
}

// ─── Closing ───

#[test]
fn test_closed_hub_rejects_new_subscriptions() {
    let hub = ChangeHub::new(4);
    let mut open = hub.subscribe(&feed()).unwrap();

    hub.close();
    hub.close();

    assert!(hub.is_closed());
    assert!(matches!(hub.subscribe(&feed()), Err(SubscriptionError::Closed)));
    assert_eq!(hub.active_subscriptions(), 1);

    hub.publish(BOOKMARKS_TABLE, ChangeEvent::Insert(bookmark("a")));
    assert_eq!(open.try_next(), Some(ChangeEvent::Insert(bookmark("a"))));
}
