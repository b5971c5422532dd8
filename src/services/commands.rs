//! Bookmark mutation commands.
//!
//! Commands validate user input, check for a signed-in user and forward the
//! mutation to the record store. They never touch the displayed list: the change
//! comes back through the feed like any other writer's change.

use std::sync::Arc;

use crate::managers::bookmark_manager::BookmarkStore;
use crate::types::bookmark::{Bookmark, NewBookmark};
use crate::types::errors::CommandError;
use crate::types::session::User;

/// Route the caller is sent to when a command needs a signed-in user.
pub const LOGIN_ROUTE: &str = "/login";

pub const MSG_REQUIRED_FIELDS: &str = "Title and URL are required.";
pub const MSG_LOGIN_REQUIRED: &str = "You must be logged in to add a bookmark.";
pub const MSG_ADD_FAILED: &str = "Failed to add bookmark";
pub const MSG_DELETE_FAILED: &str = "Failed to delete bookmark";

impl CommandError {
    /// Where the caller should be redirected, if anywhere.
    pub fn redirect(&self) -> Option<&'static str> {
        match self {
            CommandError::Unauthenticated => Some(LOGIN_ROUTE),
            _ => None,
        }
    }

    /// Text shown to the user when creating a bookmark fails.
    pub fn create_message(&self) -> String {
        match self {
            CommandError::Unauthenticated => MSG_LOGIN_REQUIRED.to_string(),
            CommandError::Validation(_) => MSG_REQUIRED_FIELDS.to_string(),
            CommandError::Remote(e) => {
                let text = e.to_string();
                if text.trim().is_empty() {
                    MSG_ADD_FAILED.to_string()
                } else {
                    text
                }
            }
        }
    }

    /// Text shown to the user when deleting a bookmark fails.
    pub fn delete_message(&self) -> String {
        match self {
            CommandError::Unauthenticated => MSG_LOGIN_REQUIRED.to_string(),
            _ => MSG_DELETE_FAILED.to_string(),
        }
    }
}

/// Create/delete commands issued against a record store.
pub struct BookmarkCommands<S> {
    store: Arc<S>,
}

impl<S: BookmarkStore> BookmarkCommands<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Creates a bookmark owned by `user`.
    ///
    /// Title and URL must be non-empty after trimming; they are stored as given.
    /// Validation happens before anything else, so invalid input never reaches
    /// the store.
    pub async fn create(
        &self,
        user: Option<&User>,
        title: &str,
        url: &str,
    ) -> Result<Bookmark, CommandError> {
        if title.trim().is_empty() || url.trim().is_empty() {
            return Err(CommandError::Validation(MSG_REQUIRED_FIELDS.to_string()));
        }

        let user = user.ok_or(CommandError::Unauthenticated)?;

        let record = NewBookmark {
            title: title.to_string(),
            url: url.to_string(),
            owner: user.id.clone(),
        };

        match self.store.insert(record).await {
            Ok(stored) => {
                tracing::info!(id = %stored.id, owner = %stored.owner, "bookmark created");
                Ok(stored)
            }
            Err(e) => {
                tracing::warn!(error = %e, "bookmark create failed");
                Err(e.into())
            }
        }
    }

    /// Deletes a bookmark by id. Failures are returned once, without retry.
    pub async fn delete(&self, id: &str) -> Result<(), CommandError> {
        if id.trim().is_empty() {
            return Err(CommandError::Validation("bookmark id is required".to_string()));
        }

        match self.store.delete(id).await {
            Ok(()) => {
                tracing::info!(id, "bookmark deleted");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(id, error = %e, "bookmark delete failed");
                Err(e.into())
            }
        }
    }
}
