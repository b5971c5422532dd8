use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the table holding bookmarks on every backend.
pub const BOOKMARKS_TABLE: &str = "bookmarks";

/// Represents a saved bookmark as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub title: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    /// Identity of the user that created the bookmark.
    #[serde(rename = "user_id")]
    pub owner: String,
}

/// Insert payload for a new bookmark. The backend assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBookmark {
    pub title: String,
    pub url: String,
    #[serde(rename = "user_id")]
    pub owner: String,
}

/// Partial update of an existing bookmark.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl BookmarkChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.url.is_none()
    }
}

/// Column a snapshot listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderColumn {
    CreatedAt,
    Title,
}

impl OrderColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderColumn::CreatedAt => "created_at",
            OrderColumn::Title => "title",
        }
    }
}

/// Ordering requested from `BookmarkStore::list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOrder {
    pub column: OrderColumn,
    pub ascending: bool,
}

impl ListOrder {
    /// Newest first, the order snapshots are seeded in.
    pub fn newest_first() -> Self {
        Self {
            column: OrderColumn::CreatedAt,
            ascending: false,
        }
    }
}

impl Default for ListOrder {
    fn default() -> Self {
        Self::newest_first()
    }
}
