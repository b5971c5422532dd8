//! Sync session for SmartMarks.
//!
//! A `SyncSession` owns one activation of the bookmark view: it seeds the
//! reconciliation store from a snapshot, holds the change feed subscription and
//! pumps events into the store. It is driven from a single task, so the store has
//! exactly one writer.
//!
//! Every activation gets a new [`Generation`]. Work started under one generation
//! (such as a snapshot fetch for a resync) is discarded if it completes after the
//! view was deactivated or re-activated.

use std::sync::Arc;

use crate::managers::bookmark_manager::BookmarkStore;
use crate::managers::change_hub::{ChangeStream, Subscription};
use crate::managers::reconciliation::{ApplyOutcome, BookmarkList};
use crate::types::bookmark::{Bookmark, ListOrder};
use crate::types::change::{ChangeEvent, ChangeFeed};
use crate::types::errors::{RemoteError, SessionError};

/// Identity of one view activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn value(&self) -> u64 {
        self.0
    }
}

struct ActiveView {
    generation: Generation,
    subscription: Subscription,
}

/// Keeps a `BookmarkList` in sync with a store and its change feed.
pub struct SyncSession<S, C> {
    store: Arc<S>,
    stream: Arc<C>,
    feed: ChangeFeed,
    list: BookmarkList,
    active: Option<ActiveView>,
    last_generation: u64,
}

impl<S: BookmarkStore, C: ChangeStream> SyncSession<S, C> {
    pub fn new(store: Arc<S>, stream: Arc<C>, feed: ChangeFeed) -> Self {
        Self {
            store,
            stream,
            feed,
            list: BookmarkList::new(),
            active: None,
            last_generation: 0,
        }
    }

    pub fn list(&self) -> &BookmarkList {
        &self.list
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Generation of the current activation, if the view is active.
    pub fn generation(&self) -> Option<Generation> {
        self.active.as_ref().map(|a| a.generation)
    }

    /// Events the current subscription has missed by falling behind.
    pub fn missed_events(&self) -> u64 {
        self.active
            .as_ref()
            .map(|a| a.subscription.missed_events())
            .unwrap_or(0)
    }

    /// Activates the view: fetches a newest-first snapshot, seeds the list and
    /// subscribes to the feed. An already active view is torn down first.
    pub async fn activate(&mut self) -> Result<Generation, SessionError> {
        self.deactivate();

        let records = self.store.list(ListOrder::newest_first()).await?;
        self.list.seed(records);

        let subscription = self.stream.subscribe(&self.feed)?;
        self.last_generation += 1;
        let generation = Generation(self.last_generation);
        self.active = Some(ActiveView {
            generation,
            subscription,
        });

        tracing::info!(
            generation = generation.value(),
            records = self.list.len(),
            "bookmark view activated"
        );
        Ok(generation)
    }

    /// Waits for the next event on the active subscription.
    ///
    /// Never resolves while the view is inactive. When the feed ends the view
    /// becomes inactive and `None` is returned.
    pub async fn next_event(&mut self) -> Option<ChangeEvent> {
        let Some(active) = self.active.as_mut() else {
            return std::future::pending().await;
        };

        match active.subscription.next().await {
            Some(event) => Some(event),
            None => {
                tracing::warn!("change feed ended; view is no longer live");
                self.active = None;
                None
            }
        }
    }

    /// Applies one event to the list.
    pub fn apply(&mut self, event: ChangeEvent) -> ApplyOutcome {
        let kind = event.kind();
        let outcome = self.list.apply(event);
        tracing::debug!(?kind, ?outcome, len = self.list.len(), "change applied");
        outcome
    }

    /// Waits for the next event and applies it.
    pub async fn process_next(&mut self) -> Option<ApplyOutcome> {
        let event = self.next_event().await?;
        Some(self.apply(event))
    }

    /// Applies every event that is already buffered. Returns how many were applied.
    pub fn drain_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self
            .active
            .as_mut()
            .and_then(|a| a.subscription.try_next())
        {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Replaces the list with an externally obtained snapshot.
    pub fn reseed(&mut self, records: Vec<Bookmark>) {
        self.list.seed(records);
    }

    /// Starts a resync of the active view. Returns `None` when the view is inactive.
    pub fn begin_resync(&self) -> Option<Generation> {
        self.generation()
    }

    /// Completes a resync started with [`begin_resync`](Self::begin_resync).
    ///
    /// Returns `Ok(false)` without touching the list when `generation` is no longer
    /// the active one, whatever the fetch result was.
    pub fn finish_resync(
        &mut self,
        generation: Generation,
        result: Result<Vec<Bookmark>, RemoteError>,
    ) -> Result<bool, RemoteError> {
        if self.generation() != Some(generation) {
            tracing::debug!(generation = generation.value(), "discarding stale snapshot");
            return Ok(false);
        }

        let records = result?;
        tracing::info!(records = records.len(), "bookmark view resynced");
        self.list.seed(records);
        Ok(true)
    }

    /// Re-fetches the snapshot and re-seeds the active view.
    pub async fn resync(&mut self) -> Result<bool, RemoteError> {
        let Some(generation) = self.begin_resync() else {
            return Ok(false);
        };
        let result = self.store.list(ListOrder::newest_first()).await;
        self.finish_resync(generation, result)
    }

    /// Deactivates and drops the list contents, back to the unseeded state.
    pub fn reset(&mut self) {
        self.deactivate();
        self.list = BookmarkList::new();
    }

    /// Releases the subscription. Returns `false` if the view was not active.
    pub fn deactivate(&mut self) -> bool {
        match self.active.take() {
            Some(active) => {
                tracing::info!(generation = active.generation.value(), "bookmark view deactivated");
                active.subscription.unsubscribe();
                true
            }
            None => false,
        }
    }
}
