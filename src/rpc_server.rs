//! SmartMarks RPC server: JSON-RPC over stdin/stdout.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"bookmark.create", "params":{"title":"...","url":"..."}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//! Push:     {"event":"bookmarks.changed", "items":[...]}
//!
//! Requests and change events are handled on one task, so the bookmark list
//! has a single writer. Events that arrive while a request is being served
//! wait in the subscription and are applied right after it.

use std::error::Error;

use serde_json::{json, Value};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};

use smartmarks::app::App;
use smartmarks::managers::bookmark_manager::BookmarkStore;
use smartmarks::rpc_handler::{change_notification, handle_method};
use smartmarks::services::logging;
use smartmarks::services::settings_engine::SettingsEngine;
use smartmarks::types::change::ChangeEvent;
use smartmarks::types::settings::BackendKind;

enum Input {
    Line(Option<String>),
    Event(Option<ChangeEvent>),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let mut engine = SettingsEngine::from_env();
    let settings = engine.load_with_env()?;
    logging::init(&settings.logging.filter);

    tracing::info!(
        backend = ?settings.backend.kind,
        site_url = %settings.site_url,
        "starting smartmarks-rpc"
    );

    match settings.backend.kind {
        BackendKind::Local => serve(App::local(settings)?).await,
        BackendKind::Rest => serve(App::remote(settings)?).await,
    }
}

async fn serve<S: BookmarkStore>(mut app: App<S>) -> Result<(), Box<dyn Error>> {
    let mut stdout = io::stdout();
    let mut lines = BufReader::new(io::stdin()).lines();

    let ready = json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")});
    write_line(&mut stdout, &ready).await?;

    loop {
        let input = tokio::select! {
            line = lines.next_line() => Input::Line(line?),
            event = app.session.next_event() => Input::Event(event),
        };

        match input {
            Input::Line(None) => break,
            Input::Line(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                let response = respond(&mut app, &line).await;
                write_line(&mut stdout, &response).await?;
            }
            Input::Event(Some(event)) => {
                let outcome = app.session.apply(event);
                if let Some(push) = change_notification(&app, outcome) {
                    write_line(&mut stdout, &push).await?;
                }
            }
            Input::Event(None) => {
                write_line(&mut stdout, &json!({"event": "session.closed"})).await?;
            }
        }
    }

    app.shutdown();
    tracing::info!("stdin closed; exiting");
    Ok(())
}

async fn respond<S: BookmarkStore>(app: &mut App<S>, line: &str) -> Value {
    let req: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => return json!({"id": null, "error": format!("parse error: {}", e)}),
    };

    let id = req.get("id").cloned().unwrap_or(Value::Null);
    let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
    let params = req.get("params").cloned().unwrap_or(json!({}));

    match handle_method(app, method, &params).await {
        Ok(val) => json!({"id": id, "result": val}),
        Err(err) => {
            tracing::debug!(method, error = %err, "request failed");
            json!({"id": id, "error": err})
        }
    }
}

async fn write_line(stdout: &mut Stdout, value: &Value) -> io::Result<()> {
    let mut line = value.to_string();
    line.push('\n');
    stdout.write_all(line.as_bytes()).await?;
    stdout.flush().await
}
