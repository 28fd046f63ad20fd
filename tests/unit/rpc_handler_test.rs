//! Unit tests for the RPC handler — the JSON-RPC methods dispatched by
//! `handle_method`, exercised through the same code path the `marksync-rpc`
//! binary uses, against the in-process backend.

use serde_json::json;
use tokio::sync::Mutex;

use marksync::app::App;
use marksync::rpc_handler::handle_method;

fn setup() -> Mutex<App> {
    Mutex::new(App::with_memory())
}

async fn start_session(app: &Mutex<App>, user_id: &str) {
    handle_method(
        app,
        "session.start",
        &json!({"user": {"id": user_id, "email": format!("{}@example.com", user_id)}}),
    )
    .await
    .expect("session should start");
}

// ─── Ping / status ───

#[tokio::test]
async fn test_ping() {
    let app = setup();
    let res = handle_method(&app, "ping", &json!({})).await.unwrap();
    assert_eq!(res, json!({"pong": true}));
}

#[tokio::test]
async fn test_status_reports_backend_and_session() {
    let app = setup();
    let res = handle_method(&app, "status", &json!({})).await.unwrap();
    assert_eq!(res["backend"], "memory");
    assert_eq!(res["user_id"], json!(null));

    start_session(&app, "ada").await;
    let res = handle_method(&app, "status", &json!({})).await.unwrap();
    assert_eq!(res["user_id"], "ada");
}

// ─── Unknown method ───

#[tokio::test]
async fn test_unknown_method_returns_error() {
    let app = setup();
    let res = handle_method(&app, "nonexistent.method", &json!({})).await;
    assert!(res.is_err());
    assert!(res.unwrap_err().contains("unknown method"));
}

// ─── Session ───

#[tokio::test]
async fn test_session_start_returns_the_initial_snapshot() {
    let app = setup();
    let res = handle_method(
        &app,
        "session.start",
        &json!({"user": {"id": "ada", "display_name": "Ada Lovelace"}}),
    )
    .await
    .unwrap();
    assert_eq!(res["bookmarks"], json!([]));
    assert_eq!(res["loading"], false);
}

#[tokio::test]
async fn test_session_start_requires_a_user_with_an_id() {
    let app = setup();
    assert!(handle_method(&app, "session.start", &json!({})).await.is_err());

    let res = handle_method(&app, "session.start", &json!({"user": {"id": "  "}})).await;
    assert!(res.is_err());
    assert!(res.unwrap_err().contains("non-empty"));
}

#[tokio::test]
async fn test_session_stop_drops_the_list() {
    let app = setup();
    start_session(&app, "ada").await;

    let res = handle_method(&app, "session.stop", &json!({})).await.unwrap();
    assert_eq!(res, json!({"ok": true}));

    let res = handle_method(&app, "list.snapshot", &json!({})).await;
    assert!(res.is_err());
    assert!(res.unwrap_err().contains("no active session"));
}

#[tokio::test]
async fn test_session_signout_without_a_gateway_still_ends_the_session() {
    let app = setup();
    start_session(&app, "ada").await;

    let res = handle_method(&app, "session.signout", &json!({})).await.unwrap();
    assert_eq!(res, json!({"ok": true}));
    assert!(handle_method(&app, "list.snapshot", &json!({})).await.is_err());
}

// ─── Bookmarks ───

#[tokio::test]
async fn test_bookmark_add_and_snapshot() {
    let app = setup();
    start_session(&app, "ada").await;

    let res = handle_method(
        &app,
        "bookmark.add",
        &json!({"title": "Example", "url": "example.com"}),
    )
    .await
    .unwrap();
    assert_eq!(res["added"], true);
    assert_eq!(res["bookmark"]["url"], "https://example.com");
    assert_eq!(res["bookmark"]["user_id"], "ada");

    let snapshot = handle_method(&app, "list.snapshot", &json!({})).await.unwrap();
    let items = snapshot["bookmarks"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Example");
}

#[tokio::test]
async fn test_bookmark_add_with_blank_fields_adds_nothing() {
    let app = setup();
    start_session(&app, "ada").await;

    let res = handle_method(&app, "bookmark.add", &json!({"title": "  ", "url": "example.com"}))
        .await
        .unwrap();
    assert_eq!(res, json!({"added": false}));

    let snapshot = handle_method(&app, "list.snapshot", &json!({})).await.unwrap();
    assert_eq!(snapshot["bookmarks"], json!([]));
}

#[tokio::test]
async fn test_bookmark_add_requires_a_session() {
    let app = setup();
    let res = handle_method(&app, "bookmark.add", &json!({"title": "X", "url": "x.com"})).await;
    assert!(res.is_err());
    assert!(res.unwrap_err().contains("no active session"));
}

#[tokio::test]
async fn test_bookmark_draft_updates_the_form() {
    let app = setup();
    start_session(&app, "ada").await;

    handle_method(
        &app,
        "bookmark.draft",
        &json!({"title": "Example", "url": "example.com", "form_open": true}),
    )
    .await
    .unwrap();

    let snapshot = handle_method(&app, "list.snapshot", &json!({})).await.unwrap();
    assert_eq!(snapshot["draft_title"], "Example");
    assert_eq!(snapshot["draft_url"], "example.com");
    assert_eq!(snapshot["form_open"], true);

    // Drafts set earlier are what bookmark.add submits.
    let res = handle_method(&app, "bookmark.add", &json!({})).await.unwrap();
    assert_eq!(res["added"], true);
    assert_eq!(res["bookmark"]["title"], "Example");
}

#[tokio::test]
async fn test_bookmark_delete_reports_ok_and_removes_the_entry() {
    let app = setup();
    start_session(&app, "ada").await;

    let res = handle_method(
        &app,
        "bookmark.add",
        &json!({"title": "Example", "url": "example.com"}),
    )
    .await
    .unwrap();
    let id = res["bookmark"]["id"].as_str().unwrap().to_string();

    let res = handle_method(&app, "bookmark.delete", &json!({"id": id})).await.unwrap();
    assert_eq!(res, json!({"ok": true}));

    let snapshot = handle_method(&app, "list.snapshot", &json!({})).await.unwrap();
    assert_eq!(snapshot["bookmarks"], json!([]));

    // Deleting something already gone is indistinguishable from success.
    let res = handle_method(&app, "bookmark.delete", &json!({"id": "no-such-id"}))
        .await
        .unwrap();
    assert_eq!(res, json!({"ok": true}));
}

#[tokio::test]
async fn test_bookmark_delete_requires_an_id() {
    let app = setup();
    start_session(&app, "ada").await;
    assert!(handle_method(&app, "bookmark.delete", &json!({})).await.is_err());
}

// ─── Feed ───

#[tokio::test]
async fn test_feed_push_merges_into_the_session_list() {
    let app = setup();
    start_session(&app, "ada").await;

    let event = json!({
        "type": "added",
        "bookmark": {
            "id": "remote-1",
            "url": "https://remote.example.com",
            "title": "From another device",
            "created_at": "2024-06-15T12:00:00Z",
            "user_id": "ada"
        }
    });
    handle_method(&app, "feed.push", &json!({"owner_id": "ada", "event": event}))
        .await
        .unwrap();
    // Duplicate delivery collapses in the merge.
    handle_method(&app, "feed.push", &json!({"owner_id": "ada", "event": event}))
        .await
        .unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let snapshot = handle_method(&app, "list.snapshot", &json!({})).await.unwrap();
    let items = snapshot["bookmarks"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], "remote-1");
}

#[tokio::test]
async fn test_feed_push_rejects_malformed_events() {
    let app = setup();
    start_session(&app, "ada").await;

    let res = handle_method(
        &app,
        "feed.push",
        &json!({"owner_id": "ada", "event": {"type": "renamed"}}),
    )
    .await;
    assert!(res.is_err());
    assert!(res.unwrap_err().contains("invalid event"));

    assert!(handle_method(&app, "feed.push", &json!({"event": {}})).await.is_err());
}

// ─── Auth ───

#[tokio::test]
async fn test_auth_methods_require_a_remote_backend() {
    let app = setup();

    let res = handle_method(
        &app,
        "auth.url",
        &json!({"redirect_to": "https://app.example.com/auth/callback"}),
    )
    .await;
    assert!(res.is_err());
    assert!(res.unwrap_err().contains("remote backend not configured"));

    assert!(handle_method(&app, "auth.user", &json!({"access_token": "t"})).await.is_err());
    assert!(handle_method(&app, "auth.refresh", &json!({"refresh_token": "t"})).await.is_err());
}

#[tokio::test]
async fn test_auth_url_with_a_remote_backend() {
    use marksync::services::config::SyncConfig;

    let config = SyncConfig {
        backend_url: Some("https://demo.example.co".to_string()),
        anon_key: Some("anon-key".to_string()),
        ..SyncConfig::default()
    };
    let app = Mutex::new(App::new(config).unwrap());

    let res = handle_method(
        &app,
        "auth.url",
        &json!({"redirect_to": "https://app.example.com/auth/callback"}),
    )
    .await
    .unwrap();
    let url = res["url"].as_str().unwrap();
    assert!(url.starts_with("https://demo.example.co/auth/v1/authorize?"));
    assert!(url.contains("provider=google"));

    assert!(handle_method(&app, "auth.url", &json!({})).await.is_err());
}
