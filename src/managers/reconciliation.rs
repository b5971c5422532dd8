//! Reconciliation store for SmartMarks.
//!
//! `BookmarkList` holds the ordered collection a view displays. It is seeded from a
//! snapshot (newest first) and then kept current only by change events:
//!
//! - inserts are prepended, whatever their `created_at`, so the list is ordered by
//!   arrival for live rows and by creation time for seeded rows;
//! - updates replace matching rows in place, keyed by the new record's id;
//! - deletes drop matching rows and are no-ops for unknown ids.
//!
//! Neither `seed` nor `apply` can fail. Events applied before the first seed are
//! ignored.

use serde::Serialize;

use crate::types::bookmark::Bookmark;
use crate::types::change::ChangeEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListState {
    Uninitialized,
    Seeded,
}

/// What an `apply` call did to the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Inserted,
    Updated(usize),
    Removed(usize),
    /// The event referenced no record in the collection.
    Unchanged,
    /// The list has not been seeded yet.
    Ignored,
}

impl ApplyOutcome {
    /// Whether the visible collection changed.
    pub fn changed(&self) -> bool {
        matches!(
            self,
            ApplyOutcome::Inserted | ApplyOutcome::Updated(_) | ApplyOutcome::Removed(_)
        )
    }
}

/// In-memory ordered bookmark collection with a single writer.
#[derive(Debug, Clone)]
pub struct BookmarkList {
    records: Vec<Bookmark>,
    state: ListState,
}

impl BookmarkList {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            state: ListState::Uninitialized,
        }
    }

    /// Replaces the whole collection with `records`, kept in the given order.
    pub fn seed(&mut self, records: Vec<Bookmark>) {
        tracing::debug!(count = records.len(), "seeding bookmark list");
        self.records = records;
        self.state = ListState::Seeded;
    }

    /// Applies one change event.
    pub fn apply(&mut self, event: ChangeEvent) -> ApplyOutcome {
        if self.state == ListState::Uninitialized {
            tracing::debug!(id = event.record_id(), "change before seed ignored");
            return ApplyOutcome::Ignored;
        }

        match event {
            ChangeEvent::Insert(record) => {
                self.records.insert(0, record);
                ApplyOutcome::Inserted
            }
            ChangeEvent::Update { record, .. } => {
                let mut replaced = 0;
                for existing in self.records.iter_mut().filter(|b| b.id == record.id) {
                    *existing = record.clone();
                    replaced += 1;
                }
                if replaced == 0 {
                    ApplyOutcome::Unchanged
                } else {
                    ApplyOutcome::Updated(replaced)
                }
            }
            ChangeEvent::Delete { id } => {
                let before = self.records.len();
                self.records.retain(|b| b.id != id);
                match before - self.records.len() {
                    0 => ApplyOutcome::Unchanged,
                    removed => ApplyOutcome::Removed(removed),
                }
            }
        }
    }

    /// Current visible collection, head first.
    pub fn snapshot(&self) -> &[Bookmark] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&Bookmark> {
        self.records.iter().find(|b| b.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn state(&self) -> ListState {
        self.state
    }
}

impl Default for BookmarkList {
    fn default() -> Self {
        Self::new()
    }
}
