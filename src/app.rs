//! App Core for SmartMarks.
//!
//! Wires settings, identity, the record store, the change hub and the sync session
//! together. Handles are passed in explicitly; nothing is process-global.

use std::sync::Arc;
use std::time::Duration;

use crate::database::connection::Database;
use crate::managers::bookmark_manager::{BookmarkManager, BookmarkStore};
use crate::managers::change_hub::{ChangeHub, PublishingStore};
use crate::managers::session_manager::{Generation, SyncSession};
use crate::services::commands::BookmarkCommands;
use crate::services::identity::{AuthState, IdentityClient};
use crate::services::presenter::{render_page, FormState, PageView};
use crate::services::rest_store::RestBookmarkStore;
use crate::types::bookmark::Bookmark;
use crate::types::errors::{AppError, CommandError, RemoteError, SessionError};
use crate::types::session::User;
use crate::types::settings::AppSettings;

/// The record store as seen by the rest of the app: writes are echoed to the hub.
pub type SharedStore<S> = Arc<PublishingStore<S>>;

/// Central application struct for one user session.
pub struct App<S: BookmarkStore> {
    pub settings: AppSettings,
    pub identity: IdentityClient,
    pub auth: AuthState,
    pub hub: ChangeHub,
    pub store: SharedStore<S>,
    pub commands: BookmarkCommands<PublishingStore<S>>,
    pub session: SyncSession<PublishingStore<S>, ChangeHub>,
    pub form: FormState,
    /// Transient message shown above the list (e.g. a failed delete).
    pub notice: Option<String>,
}

impl<S: BookmarkStore> App<S> {
    /// Builds the app around an existing record store.
    pub fn with_store(settings: AppSettings, store: S) -> Result<Self, AppError> {
        let hub = ChangeHub::new(settings.realtime.buffer);
        let store = Arc::new(PublishingStore::new(
            store,
            hub.clone(),
            &settings.realtime.feed.table,
        ));

        let auth_base = settings
            .backend
            .url
            .clone()
            .unwrap_or_else(|| settings.site_url.clone());
        let identity = IdentityClient::new(&auth_base, &settings.site_url)?;

        let commands = BookmarkCommands::new(store.clone());
        let session = SyncSession::new(
            store.clone(),
            Arc::new(hub.clone()),
            settings.realtime.feed.clone(),
        );

        Ok(Self {
            settings,
            identity,
            auth: AuthState::new(),
            hub,
            store,
            commands,
            session,
            form: FormState::new(),
            notice: None,
        })
    }

    pub fn current_user(&self) -> Option<&User> {
        self.auth.current_user()
    }

    /// Opens the bookmark view for the signed-in user.
    ///
    /// Returns `Ok(None)` without touching the store when nobody is signed in; the
    /// caller should redirect to the login route.
    pub async fn open_view(&mut self) -> Result<Option<Generation>, SessionError> {
        if !self.auth.is_authenticated() {
            return Ok(None);
        }
        self.notice = None;
        self.session.activate().await.map(Some)
    }

    pub fn close_view(&mut self) -> bool {
        self.session.deactivate()
    }

    /// Re-fetches the snapshot for the open view.
    pub async fn resync(&mut self) -> Result<bool, RemoteError> {
        self.session.resync().await
    }

    /// Submits the add-bookmark form.
    pub async fn submit_bookmark(
        &mut self,
        title: &str,
        url: &str,
    ) -> Result<Bookmark, CommandError> {
        self.form.set_input(title, url);
        self.form.begin_submit();
        let result = self
            .commands
            .create(self.auth.current_user(), title, url)
            .await;
        self.form.finish_submit(&result);
        result
    }

    /// Deletes a bookmark for the signed-in user; a failure becomes the page notice.
    pub async fn delete_bookmark(&mut self, id: &str) -> Result<(), CommandError> {
        let result = if self.auth.is_authenticated() {
            self.commands.delete(id).await
        } else {
            Err(CommandError::Unauthenticated)
        };
        self.notice = result.as_ref().err().map(CommandError::delete_message);
        result
    }

    /// Records the user from the OAuth callback. `access_token`, when given, is
    /// sent with every later store request in place of the public key.
    pub fn complete_login(&mut self, user: User, access_token: Option<&str>) {
        if self.auth.is_authenticated() {
            self.sign_out();
        }
        self.store.set_access_token(access_token);
        self.auth.complete_login(user);
    }

    /// Signs out, tears down the view and forgets its contents.
    pub fn sign_out(&mut self) {
        self.session.reset();
        self.store.set_access_token(None);
        self.auth.sign_out();
        self.form = FormState::new();
        self.notice = None;
    }

    pub fn render_page(&self) -> PageView {
        render_page(
            self.auth.current_user(),
            self.session.list(),
            &self.form,
            self.notice.as_deref(),
        )
    }

    /// Feeds a change made by another writer into the hub.
    pub fn ingest_change(&self, payload: &serde_json::Value) -> Result<usize, RemoteError> {
        self.hub
            .publish_payload(&self.settings.realtime.feed.table, payload)
    }

    /// Releases the subscription and closes the hub; called once on exit.
    pub fn shutdown(&mut self) {
        if self.session.deactivate() {
            tracing::info!("session closed on shutdown");
        }
        self.hub.close();
    }
}

impl App<BookmarkManager> {
    /// App backed by the SQLite database named in the settings.
    pub fn local(settings: AppSettings) -> Result<Self, AppError> {
        let db = Database::open(&settings.backend.database_path)?;
        Self::with_store(settings, BookmarkManager::new(db))
    }

    /// App backed by a throwaway in-memory database.
    pub fn in_memory(settings: AppSettings) -> Result<Self, AppError> {
        let db = Database::open_in_memory()?;
        Self::with_store(settings, BookmarkManager::new(db))
    }
}

impl App<RestBookmarkStore> {
    /// App backed by the hosted REST backend named in the settings.
    pub fn remote(settings: AppSettings) -> Result<Self, AppError> {
        let backend = &settings.backend;
        let url = backend
            .url
            .as_deref()
            .ok_or_else(|| AppError::Http("backend.url is not configured".to_string()))?;
        let api_key = backend
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Http("backend.api_key is not configured".to_string()))?;

        let store = RestBookmarkStore::new(
            url,
            &settings.realtime.feed.table,
            api_key,
            Duration::from_secs(backend.timeout_secs),
        )?;
        Self::with_store(settings, store)
    }
}
