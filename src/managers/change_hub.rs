//! Change feed for SmartMarks.
//!
//! `ChangeHub` is an in-process change-notification stream: every write that goes
//! through a [`PublishingStore`] is broadcast to all open [`Subscription`]s whose
//! feed matches the table and event kind. Changes made by other writers enter the
//! hub as upstream payloads through [`ChangeHub::publish_payload`].
//!
//! Delivery is best-effort: a subscriber that falls behind the hub's buffer
//! silently misses events (they are counted, logged and never replayed). Callers
//! recover by re-seeding from a snapshot.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

use crate::managers::bookmark_manager::BookmarkStore;
use crate::types::bookmark::{Bookmark, BookmarkChanges, ListOrder, NewBookmark};
use crate::types::change::{ChangeEvent, ChangeFeed};
use crate::types::errors::{RemoteError, SubscriptionError};

/// Source of change feed subscriptions.
pub trait ChangeStream: Send + Sync {
    /// Opens a subscription. The caller owns it and must release it with
    /// [`Subscription::unsubscribe`] (or drop it) when its view goes away.
    fn subscribe(&self, feed: &ChangeFeed) -> Result<Subscription, SubscriptionError>;
}

/// A change tagged with the table it happened on.
#[derive(Debug, Clone)]
pub struct TableChange {
    pub table: String,
    pub event: ChangeEvent,
}

/// Broadcast hub fanning table changes out to subscribers.
#[derive(Clone)]
pub struct ChangeHub {
    sender: broadcast::Sender<TableChange>,
    active: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
}

impl ChangeHub {
    /// Creates a hub buffering up to `capacity` undelivered events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            active: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Publishes a change. Returns the number of subscribers it was handed to.
    pub fn publish(&self, table: &str, event: ChangeEvent) -> usize {
        tracing::debug!(table, kind = ?event.kind(), id = event.record_id(), "publishing change");
        self.sender
            .send(TableChange {
                table: table.to_string(),
                event,
            })
            .unwrap_or(0)
    }

    /// Decodes an upstream change payload and publishes it.
    ///
    /// The payload's `table` field names the table; payloads without one are
    /// published on `default_table`. Returns the number of subscribers reached.
    pub fn publish_payload(
        &self,
        default_table: &str,
        payload: &Value,
    ) -> Result<usize, RemoteError> {
        let event = ChangeEvent::from_payload(payload)?;
        let table = payload
            .get("table")
            .and_then(|t| t.as_str())
            .unwrap_or(default_table);
        Ok(self.publish(table, event))
    }

    /// Stops accepting new subscriptions. Open subscriptions keep receiving events.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::info!(active = self.active_subscriptions(), "change hub closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of subscriptions that have not been released yet.
    pub fn active_subscriptions(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

impl ChangeStream for ChangeHub {
    fn subscribe(&self, feed: &ChangeFeed) -> Result<Subscription, SubscriptionError> {
        if self.is_closed() {
            return Err(SubscriptionError::Closed);
        }
        if feed.channel.trim().is_empty() {
            return Err(SubscriptionError::InvalidFeed("channel name is empty".to_string()));
        }
        if feed.table.trim().is_empty() {
            return Err(SubscriptionError::InvalidFeed("table name is empty".to_string()));
        }

        self.active.fetch_add(1, Ordering::SeqCst);
        tracing::info!(channel = %feed.channel, table = %feed.table, "subscribed to change feed");

        Ok(Subscription {
            feed: feed.clone(),
            receiver: self.sender.subscribe(),
            active: self.active.clone(),
            missed: 0,
        })
    }
}

/// One open subscription to a change feed.
///
/// Yields events in arrival order. Not restartable: once `next` returns `None`
/// the subscription is finished.
pub struct Subscription {
    feed: ChangeFeed,
    receiver: broadcast::Receiver<TableChange>,
    active: Arc<AtomicUsize>,
    missed: u64,
}

impl Subscription {
    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    /// Events skipped because this subscriber fell behind.
    pub fn missed_events(&self) -> u64 {
        self.missed
    }

    fn accepts(&self, change: &TableChange) -> bool {
        change.table == self.feed.table && self.feed.filter.matches(change.event.kind())
    }

    fn record_gap(&mut self, skipped: u64) {
        self.missed += skipped;
        tracing::warn!(
            channel = %self.feed.channel,
            skipped,
            total_missed = self.missed,
            "change feed lagged; events were dropped"
        );
    }

    /// Waits for the next matching event. Returns `None` once the stream is closed.
    ///
    /// Cancel-safe: dropping the future loses no events.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(change) if self.accepts(&change) => return Some(change.event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => self.record_gap(skipped),
                Err(RecvError::Closed) => {
                    tracing::warn!(channel = %self.feed.channel, "change feed closed");
                    return None;
                }
            }
        }
    }

    /// Returns the next matching event that is already buffered, without waiting.
    pub fn try_next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(change) if self.accepts(&change) => return Some(change.event),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(skipped)) => self.record_gap(skipped),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Releases the subscription.
    pub fn unsubscribe(self) {
        tracing::info!(channel = %self.feed.channel, "unsubscribed from change feed");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Wraps a `BookmarkStore` and publishes a change event for every successful write.
pub struct PublishingStore<S> {
    inner: S,
    hub: ChangeHub,
    table: String,
}

impl<S: BookmarkStore> PublishingStore<S> {
    pub fn new(inner: S, hub: ChangeHub, table: &str) -> Self {
        Self {
            inner,
            hub,
            table: table.to_string(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn hub(&self) -> &ChangeHub {
        &self.hub
    }
}

impl<S: BookmarkStore> BookmarkStore for PublishingStore<S> {
    async fn list(&self, order: ListOrder) -> Result<Vec<Bookmark>, RemoteError> {
        self.inner.list(order).await
    }

    async fn insert(&self, record: NewBookmark) -> Result<Bookmark, RemoteError> {
        let stored = self.inner.insert(record).await?;
        self.hub.publish(&self.table, ChangeEvent::Insert(stored.clone()));
        Ok(stored)
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        self.inner.delete(id).await?;
        self.hub.publish(&self.table, ChangeEvent::Delete { id: id.to_string() });
        Ok(())
    }

    async fn update(&self, id: &str, changes: BookmarkChanges) -> Result<Bookmark, RemoteError> {
        let stored = self.inner.update(id, changes).await?;
        self.hub.publish(
            &self.table,
            ChangeEvent::Update {
                old_id: Some(id.to_string()),
                record: stored.clone(),
            },
        );
        Ok(stored)
    }

    fn set_access_token(&self, token: Option<&str>) {
        self.inner.set_access_token(token);
    }
}
