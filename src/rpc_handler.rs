//! RPC method handler for the marksync JSON-RPC protocol.
//!
//! Extracted from `rpc_server.rs` so it can be unit-tested independently.
//! The `handle_method` function dispatches JSON-RPC method calls to the
//! `App`'s session, auth gateway, and feed hub.

use tokio::sync::Mutex;

use crate::app::App;
use crate::services::auth::AuthGatewayTrait;
use crate::types::event::BookmarkEvent;
use crate::types::user::AuthUser;

use serde_json::{json, Value};

/// Dispatch a JSON-RPC method call to the appropriate handler.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub async fn handle_method(app: &Mutex<App>, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true})),

        "status" => {
            let a = app.lock().await;
            let user_id = a.session().map(|s| s.user().id.clone());
            Ok(json!({
                "version": env!("CARGO_PKG_VERSION"),
                "backend": a.backend_kind(),
                "user_id": user_id,
            }))
        }

        // ─── Auth ───
        "auth.url" => {
            let provider = params
                .get("provider")
                .and_then(|v| v.as_str())
                .unwrap_or("google");
            let redirect_to = params
                .get("redirect_to")
                .and_then(|v| v.as_str())
                .ok_or("missing redirect_to")?;
            let a = app.lock().await;
            let auth = a.auth().ok_or("remote backend not configured")?;
            Ok(json!({"url": auth.authorize_url(provider, redirect_to)}))
        }
        "auth.user" => {
            let token = params
                .get("access_token")
                .and_then(|v| v.as_str())
                .ok_or("missing access_token")?;
            let auth = app
                .lock()
                .await
                .auth()
                .ok_or("remote backend not configured")?;
            let user = auth.fetch_user(token).await.map_err(|e| e.to_string())?;
            serde_json::to_value(&user).map_err(|e| e.to_string())
        }
        "auth.refresh" => {
            let token = params
                .get("refresh_token")
                .and_then(|v| v.as_str())
                .ok_or("missing refresh_token")?;
            let auth = app
                .lock()
                .await
                .auth()
                .ok_or("remote backend not configured")?;
            let session = auth
                .refresh_session(token)
                .await
                .map_err(|e| e.to_string())?;
            serde_json::to_value(&session).map_err(|e| e.to_string())
        }

        // ─── Session ───
        "session.start" => {
            let user_value = params.get("user").cloned().ok_or("missing user")?;
            let user: AuthUser =
                serde_json::from_value(user_value).map_err(|e| format!("invalid user: {}", e))?;
            if user.id.trim().is_empty() {
                return Err("user.id must be non-empty".to_string());
            }
            let mut a = app.lock().await;
            let list = a.start_session(user).await;
            let snapshot = list.snapshot().await;
            serde_json::to_value(&snapshot).map_err(|e| e.to_string())
        }
        "session.stop" => {
            app.lock().await.stop_session();
            Ok(json!({"ok": true}))
        }
        "session.signout" => {
            let token = params.get("access_token").and_then(|v| v.as_str());
            let mut a = app.lock().await;
            a.sign_out(token).await.map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        // ─── List ───
        "list.snapshot" => {
            let a = app.lock().await;
            let list = a.session().ok_or("no active session")?;
            let snapshot = list.snapshot().await;
            serde_json::to_value(&snapshot).map_err(|e| e.to_string())
        }

        // ─── Bookmarks ───
        "bookmark.draft" => {
            let title = params.get("title").and_then(|v| v.as_str());
            let url = params.get("url").and_then(|v| v.as_str());
            let form_open = params.get("form_open").and_then(|v| v.as_bool());
            let a = app.lock().await;
            let list = a.session().ok_or("no active session")?;
            list.set_drafts(title, url).await;
            if let Some(open) = form_open {
                list.set_form_open(open).await;
            }
            Ok(json!({"ok": true}))
        }
        "bookmark.add" => {
            let title = params.get("title").and_then(|v| v.as_str());
            let url = params.get("url").and_then(|v| v.as_str());
            let a = app.lock().await;
            let list = a.session().ok_or("no active session")?;
            if title.is_some() || url.is_some() {
                list.set_drafts(title, url).await;
            }
            match list.add_bookmark().await.map_err(|e| e.to_string())? {
                Some(bookmark) => Ok(json!({"added": true, "bookmark": bookmark})),
                None => Ok(json!({"added": false})),
            }
        }
        "bookmark.delete" => {
            let id = params.get("id").and_then(|v| v.as_str()).ok_or("missing id")?;
            let a = app.lock().await;
            let list = a.session().ok_or("no active session")?;
            // Optimistic: the local removal already happened and stands even
            // if the backend call failed, so the caller always sees success.
            let _ = list.delete_bookmark(id).await;
            Ok(json!({"ok": true}))
        }

        // ─── Feed ───
        "feed.push" => {
            let owner_id = params
                .get("owner_id")
                .and_then(|v| v.as_str())
                .ok_or("missing owner_id")?;
            let event_value = params.get("event").cloned().ok_or("missing event")?;
            let event: BookmarkEvent = serde_json::from_value(event_value)
                .map_err(|e| format!("invalid event: {}", e))?;
            let a = app.lock().await;
            a.feed().publish(a.table(), owner_id, event).await;
            Ok(json!({"ok": true}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
