//! RPC method handler for the SmartMarks JSON-RPC protocol.
//!
//! Kept apart from `rpc_server.rs` so it can be unit-tested independently.
//! `handle_method` dispatches one call against the `App`; command failures that
//! the user should see are returned as `{"ok": false, "error": ...}` results,
//! protocol problems (unknown method, malformed params) as `Err`. Bookmark reads
//! and deletes answer `{"redirect": "/login"}` while nobody is signed in.
//!
//! `realtime.push` is the inbound side of the change feed: the upstream realtime
//! connector forwards each postgres-changes payload here, and it reaches the open
//! view through the hub like a local write.

use serde_json::{json, Value};

use crate::app::App;
use crate::managers::bookmark_manager::BookmarkStore;
use crate::managers::reconciliation::ApplyOutcome;
use crate::services::commands::LOGIN_ROUTE;
use crate::services::identity::OAuthProvider;
use crate::services::presenter::render_items;
use crate::types::session::User;

fn str_param<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.as_str())
}

/// Current list rows as JSON.
pub fn items_json<S: BookmarkStore>(app: &App<S>) -> Value {
    json!(render_items(app.session.list()))
}

/// Push notification sent after an event changed the visible list.
pub fn change_notification<S: BookmarkStore>(app: &App<S>, outcome: ApplyOutcome) -> Option<Value> {
    if !outcome.changed() {
        return None;
    }
    Some(json!({"event": "bookmarks.changed", "items": items_json(app)}))
}

/// Dispatch a JSON-RPC method call to the appropriate handler.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub async fn handle_method<S: BookmarkStore>(
    app: &mut App<S>,
    method: &str,
    params: &Value,
) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true})),

        // ─── Auth ───
        "auth.login" => {
            let provider = str_param(params, "provider")
                .unwrap_or("google")
                .parse::<OAuthProvider>()
                .map_err(|e| e.to_string())?;
            let redirect_to = str_param(params, "redirect_to");
            let redirect = app
                .identity
                .begin_oauth_login(provider, redirect_to)
                .map_err(|e| e.to_string())?;
            Ok(json!({"redirect": redirect.url}))
        }
        "auth.callback" => {
            let user_id = str_param(params, "user_id")
                .filter(|s| !s.trim().is_empty())
                .ok_or("missing user_id")?;
            let email = str_param(params, "email").map(str::to_string);
            let access_token = str_param(params, "access_token").filter(|s| !s.trim().is_empty());
            app.complete_login(
                User {
                    id: user_id.to_string(),
                    email,
                },
                access_token,
            );
            Ok(json!({"ok": true, "redirect": "/"}))
        }
        "auth.logout" => {
            app.sign_out();
            Ok(json!({"ok": true, "redirect": LOGIN_ROUTE}))
        }

        // ─── Session ───
        "session.open" => match app.open_view().await.map_err(|e| e.to_string())? {
            Some(generation) => {
                let page = serde_json::to_value(app.render_page()).map_err(|e| e.to_string())?;
                Ok(json!({"generation": generation.value(), "page": page}))
            }
            None => Ok(json!({"redirect": LOGIN_ROUTE})),
        },
        "session.close" => Ok(json!({"closed": app.close_view()})),
        "session.resync" => {
            let resynced = app.resync().await.map_err(|e| e.to_string())?;
            Ok(json!({"resynced": resynced, "items": items_json(app)}))
        }

        // ─── Page ───
        "page.render" => serde_json::to_value(app.render_page()).map_err(|e| e.to_string()),

        // ─── Bookmarks ───
        "bookmark.list" | "bookmark.delete" if !app.auth.is_authenticated() => {
            Ok(json!({"redirect": LOGIN_ROUTE}))
        }
        "bookmark.list" => Ok(json!({
            "live": app.session.is_active(),
            "items": items_json(app),
        })),
        "bookmark.create" => {
            let title = str_param(params, "title").unwrap_or("");
            let url = str_param(params, "url").unwrap_or("");
            match app.submit_bookmark(title, url).await {
                Ok(bookmark) => Ok(json!({"ok": true, "id": bookmark.id})),
                Err(e) => Ok(json!({
                    "ok": false,
                    "error": e.create_message(),
                    "redirect": e.redirect(),
                })),
            }
        }
        "bookmark.delete" => {
            let id = str_param(params, "id").ok_or("missing id")?;
            match app.delete_bookmark(id).await {
                Ok(()) => Ok(json!({"ok": true})),
                Err(e) => Ok(json!({"ok": false, "error": e.delete_message()})),
            }
        }

        // ─── Realtime ───
        "realtime.push" => {
            let payload = params.get("payload").ok_or("missing payload")?;
            let delivered = app.ingest_change(payload).map_err(|e| e.to_string())?;
            Ok(json!({"delivered": delivered}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
