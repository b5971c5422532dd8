use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::bookmark::{Bookmark, BOOKMARKS_TABLE};
use crate::types::errors::RemoteError;

/// A single change on the bookmarks table, as delivered by a change feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeEvent {
    Insert(Bookmark),
    /// `old_id` is informational; the store matches on `record.id`.
    Update {
        old_id: Option<String>,
        record: Bookmark,
    },
    Delete {
        id: String,
    },
}

impl ChangeEvent {
    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangeEvent::Insert(_) => ChangeKind::Insert,
            ChangeEvent::Update { .. } => ChangeKind::Update,
            ChangeEvent::Delete { .. } => ChangeKind::Delete,
        }
    }

    /// Id of the record the event is about.
    pub fn record_id(&self) -> &str {
        match self {
            ChangeEvent::Insert(record) => &record.id,
            ChangeEvent::Update { record, .. } => &record.id,
            ChangeEvent::Delete { id } => id,
        }
    }

    /// Parses a postgres-changes style payload:
    /// `{"eventType": "INSERT", "new": {...}, "old": {...}}`.
    pub fn from_payload(payload: &Value) -> Result<Self, RemoteError> {
        let event_type = payload
            .get("eventType")
            .and_then(|v| v.as_str())
            .ok_or_else(|| RemoteError::Decode("missing eventType".to_string()))?;

        match event_type {
            "INSERT" => Ok(ChangeEvent::Insert(record_field(payload, "new")?)),
            "UPDATE" => {
                let record = record_field(payload, "new")?;
                let old_id = payload
                    .get("old")
                    .and_then(|old| old.get("id"))
                    .and_then(|id| id.as_str())
                    .map(str::to_string);
                Ok(ChangeEvent::Update { old_id, record })
            }
            "DELETE" => {
                let id = payload
                    .get("old")
                    .and_then(|old| old.get("id"))
                    .and_then(|id| id.as_str())
                    .ok_or_else(|| {
                        RemoteError::Decode("delete payload without old.id".to_string())
                    })?;
                Ok(ChangeEvent::Delete { id: id.to_string() })
            }
            other => Err(RemoteError::Decode(format!("unknown eventType: {}", other))),
        }
    }
}

fn record_field(payload: &Value, field: &str) -> Result<Bookmark, RemoteError> {
    let value = payload
        .get(field)
        .cloned()
        .ok_or_else(|| RemoteError::Decode(format!("payload without {}", field)))?;
    serde_json::from_value(value)
        .map_err(|e| RemoteError::Decode(format!("invalid {} record: {}", field, e)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Which change kinds a subscription receives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventFilter {
    #[default]
    #[serde(rename = "*")]
    All,
    #[serde(rename = "INSERT")]
    Insert,
    #[serde(rename = "UPDATE")]
    Update,
    #[serde(rename = "DELETE")]
    Delete,
}

impl EventFilter {
    pub fn matches(&self, kind: ChangeKind) -> bool {
        matches!(
            (self, kind),
            (EventFilter::All, _)
                | (EventFilter::Insert, ChangeKind::Insert)
                | (EventFilter::Update, ChangeKind::Update)
                | (EventFilter::Delete, ChangeKind::Delete)
        )
    }
}

/// A named change feed scoped to one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeFeed {
    pub channel: String,
    pub table: String,
    #[serde(default)]
    pub filter: EventFilter,
}

impl ChangeFeed {
    pub fn new(channel: &str, table: &str, filter: EventFilter) -> Self {
        Self {
            channel: channel.to_string(),
            table: table.to_string(),
            filter,
        }
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new("realtime bookmarks", BOOKMARKS_TABLE, EventFilter::All)
    }
}
