//! Bookmark record store for SmartMarks.
//!
//! Defines the `BookmarkStore` boundary (list, insert, delete, update against the
//! bookmarks table) and `BookmarkManager`, the local implementation backed by
//! SQLite via `rusqlite`.

use std::future::Future;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use crate::database::connection::Database;
use crate::types::bookmark::{Bookmark, BookmarkChanges, ListOrder, NewBookmark, OrderColumn};
use crate::types::errors::RemoteError;

/// Operations against the remote bookmarks table.
///
/// Every call is a suspension point; callers must tolerate events arriving
/// while a call is outstanding.
pub trait BookmarkStore: Send + Sync {
    /// Reads every visible bookmark in the requested order.
    fn list(
        &self,
        order: ListOrder,
    ) -> impl Future<Output = Result<Vec<Bookmark>, RemoteError>> + Send;

    /// Inserts a bookmark and returns the stored record with server-assigned fields.
    fn insert(
        &self,
        record: NewBookmark,
    ) -> impl Future<Output = Result<Bookmark, RemoteError>> + Send;

    /// Deletes by id. Deleting an absent id is not an error.
    fn delete(&self, id: &str) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Applies a partial update and returns the new record.
    fn update(
        &self,
        id: &str,
        changes: BookmarkChanges,
    ) -> impl Future<Output = Result<Bookmark, RemoteError>> + Send;

    /// Sets (or with `None` clears) the signed-in user's access token.
    ///
    /// Stores without per-user credentials ignore it.
    fn set_access_token(&self, _token: Option<&str>) {}
}

const SELECT_COLUMNS: &str = "SELECT id, title, url, created_at, user_id FROM bookmarks";

/// Local bookmark backend backed by a SQLite database.
pub struct BookmarkManager {
    db: Mutex<Database>,
}

impl BookmarkManager {
    /// Creates a new `BookmarkManager` owning the provided database.
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Database>, RemoteError> {
        self.db
            .lock()
            .map_err(|e| RemoteError::Database(format!("database lock poisoned: {}", e)))
    }

    /// Server-assigned creation time, truncated to the stored precision.
    fn now() -> DateTime<Utc> {
        Utc::now().trunc_subsecs(6)
    }

    /// Fixed-width RFC 3339 text so that lexical order matches time order.
    fn encode_timestamp(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
    }

    fn order_clause(order: ListOrder) -> &'static str {
        match (order.column, order.ascending) {
            (OrderColumn::CreatedAt, false) => "ORDER BY created_at DESC, rowid DESC",
            (OrderColumn::CreatedAt, true) => "ORDER BY created_at ASC, rowid ASC",
            (OrderColumn::Title, false) => "ORDER BY title DESC, rowid DESC",
            (OrderColumn::Title, true) => "ORDER BY title ASC, rowid ASC",
        }
    }

    /// Reads a single `Bookmark` row into a struct.
    fn row_to_bookmark(row: &rusqlite::Row) -> rusqlite::Result<Bookmark> {
        let created_at: String = row.get(3)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?
            .with_timezone(&Utc);
        Ok(Bookmark {
            id: row.get(0)?,
            title: row.get(1)?,
            url: row.get(2)?,
            created_at,
            owner: row.get(4)?,
        })
    }

    fn fetch(db: &Database, id: &str) -> Result<Option<Bookmark>, RemoteError> {
        let sql = format!("{} WHERE id = ?1", SELECT_COLUMNS);
        let found = db
            .connection()
            .query_row(&sql, params![id], Self::row_to_bookmark)
            .optional()?;
        Ok(found)
    }

    fn list_sync(&self, order: ListOrder) -> Result<Vec<Bookmark>, RemoteError> {
        let db = self.lock()?;
        let sql = format!("{} {}", SELECT_COLUMNS, Self::order_clause(order));
        let mut stmt = db.connection().prepare(&sql)?;
        let rows = stmt.query_map([], Self::row_to_bookmark)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    fn insert_sync(&self, record: NewBookmark) -> Result<Bookmark, RemoteError> {
        let bookmark = Bookmark {
            id: Uuid::new_v4().to_string(),
            title: record.title,
            url: record.url,
            created_at: Self::now(),
            owner: record.owner,
        };

        let db = self.lock()?;
        db.connection().execute(
            "INSERT INTO bookmarks (id, title, url, created_at, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                bookmark.id,
                bookmark.title,
                bookmark.url,
                Self::encode_timestamp(&bookmark.created_at),
                bookmark.owner
            ],
        )?;

        tracing::debug!(id = %bookmark.id, "bookmark inserted");
        Ok(bookmark)
    }

    fn delete_sync(&self, id: &str) -> Result<(), RemoteError> {
        let db = self.lock()?;
        let affected = db
            .connection()
            .execute("DELETE FROM bookmarks WHERE id = ?1", params![id])?;

        if affected == 0 {
            tracing::debug!(id, "delete matched no bookmark");
        }
        Ok(())
    }

    fn update_sync(&self, id: &str, changes: BookmarkChanges) -> Result<Bookmark, RemoteError> {
        let db = self.lock()?;
        let affected = db.connection().execute(
            "UPDATE bookmarks SET title = COALESCE(?1, title), url = COALESCE(?2, url)
             WHERE id = ?3",
            params![changes.title, changes.url, id],
        )?;

        if affected == 0 {
            return Err(RemoteError::NotFound(id.to_string()));
        }
        Self::fetch(&db, id)?.ok_or_else(|| RemoteError::NotFound(id.to_string()))
    }
}

impl BookmarkStore for BookmarkManager {
    async fn list(&self, order: ListOrder) -> Result<Vec<Bookmark>, RemoteError> {
        self.list_sync(order)
    }

    async fn insert(&self, record: NewBookmark) -> Result<Bookmark, RemoteError> {
        self.insert_sync(record)
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        self.delete_sync(id)
    }

    async fn update(&self, id: &str, changes: BookmarkChanges) -> Result<Bookmark, RemoteError> {
        self.update_sync(id, changes)
    }
}
