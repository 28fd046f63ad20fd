//! marksync — personal bookmark saving with near-real-time sync.
//!
//! Entry point: runs a console demo of the sync core against the in-process
//! backend. The `marksync-rpc` binary exposes the same core to a host UI.

use std::time::Duration;

use marksync::types::user::AuthUser;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                marksync v{} — Demo Mode                    ║", env!("CARGO_PKG_VERSION"));
    println!("║     Bookmark saving with cross-tab and cross-device sync    ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    demo_memory_backend().await;
    demo_sync_list().await;
    demo_cross_tab().await;
    demo_auth_gateway();
    demo_app_core().await;

    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("  ✅ All 5 components demonstrated successfully!");
    println!("  marksync is ready for host UI integration.");
    println!("═══════════════════════════════════════════════════════════════");
}

fn section(name: &str) {
    println!("───────────────────────────────────────────────────────────────");
    println!("  📦 {}", name);
    println!("───────────────────────────────────────────────────────────────");
}

fn demo_user(id: &str, name: &str) -> AuthUser {
    AuthUser {
        id: id.to_string(),
        email: Some(format!("{}@example.com", id)),
        display_name: Some(name.to_string()),
        avatar_url: None,
    }
}

/// Give the spawned subscription pumps a moment to drain their channels.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

async fn demo_memory_backend() {
    use marksync::backend::memory::MemoryBackend;
    use marksync::backend::records::RecordStore;
    use marksync::types::bookmark::NewBookmark;
    section("In-Process Backend");

    let backend = MemoryBackend::new();
    let stored = backend
        .insert(NewBookmark {
            url: "https://doc.rust-lang.org".to_string(),
            title: "The Rust Book".to_string(),
            user_id: "ada".to_string(),
        })
        .await
        .expect("insert failed");
    println!("  Inserted \"{}\" with id {}", stored.title, stored.id);

    backend
        .insert(NewBookmark {
            url: "https://news.example.com".to_string(),
            title: "Morning paper".to_string(),
            user_id: "grace".to_string(),
        })
        .await
        .expect("insert failed");

    let ada_rows = backend.list_by_owner("ada").await.unwrap();
    println!("  ada sees {} record(s), grace's rows stay invisible", ada_rows.len());

    backend.delete(&stored.id).await.unwrap();
    backend.delete("no-such-id").await.unwrap();
    println!("  Deleted by id; deleting an absent id is a clean no-op");
    println!("  {} row(s) remain in total", backend.row_count().await);
    println!("  ✓ MemoryBackend OK");
    println!();
}

async fn demo_sync_list() {
    use std::sync::Arc;
    use marksync::backend::broadcast::TabBus;
    use marksync::backend::feed::ChangeFeed;
    use marksync::backend::memory::MemoryBackend;
    use marksync::backend::records::RecordStore;
    use marksync::managers::sync_list::BookmarkSyncList;
    section("Bookmark Sync List");

    let backend = Arc::new(MemoryBackend::new());
    let store: Arc<dyn RecordStore> = backend.clone();
    let feed: Arc<dyn ChangeFeed> = backend.hub();
    let user = demo_user("ada", "Ada Lovelace");
    println!("  Welcome, {}!", user.first_name());

    let mut list = BookmarkSyncList::attach(user, store, feed, TabBus::new(), "bookmarks").await;
    println!("  Attached: {} bookmarks, loading = {}", list.snapshot().await.bookmarks.len(), list.snapshot().await.loading);

    list.set_drafts(Some("Rust std docs"), Some("doc.rust-lang.org/std")).await;
    let added = list.add_bookmark().await.unwrap().expect("drafts were blank");
    println!("  Added \"{}\" -> {}", added.title, added.url);
    println!("  Favicon: {}", added.favicon_url().unwrap_or_else(|| "(none)".to_string()));
    println!("  Age: {}", added.age_label(chrono::Utc::now()));

    settle().await;
    let snapshot = list.snapshot().await;
    println!(
        "  List has {} entry(ies) after the feed echoed our own write back",
        snapshot.bookmarks.len()
    );

    list.delete_bookmark(&added.id).await.unwrap();
    println!("  Deleted optimistically; {} entry(ies) remain", list.snapshot().await.bookmarks.len());

    list.detach();
    println!("  ✓ BookmarkSyncList OK");
    println!();
}

async fn demo_cross_tab() {
    use std::sync::Arc;
    use marksync::backend::broadcast::TabBus;
    use marksync::backend::feed::ChangeFeed;
    use marksync::backend::memory::MemoryBackend;
    use marksync::backend::records::RecordStore;
    use marksync::managers::sync_list::BookmarkSyncList;
    section("Cross-Tab Sync");

    let backend = Arc::new(MemoryBackend::new());
    let bus = TabBus::new();
    let user = demo_user("ada", "Ada Lovelace");

    let store_a: Arc<dyn RecordStore> = backend.clone();
    let feed_a: Arc<dyn ChangeFeed> = backend.hub();
    let mut tab_a =
        BookmarkSyncList::attach(user.clone(), store_a, feed_a, bus.clone(), "bookmarks").await;

    let store_b: Arc<dyn RecordStore> = backend.clone();
    let feed_b: Arc<dyn ChangeFeed> = backend.hub();
    let mut tab_b =
        BookmarkSyncList::attach(user, store_b, feed_b, bus.clone(), "bookmarks").await;

    tab_a.set_drafts(Some("Shared read"), Some("blog.example.com/post")).await;
    let added = tab_a.add_bookmark().await.unwrap().expect("drafts were blank");
    settle().await;

    let a_count = tab_a.snapshot().await.bookmarks.len();
    let b_count = tab_b.snapshot().await.bookmarks.len();
    println!("  Tab A added one bookmark; A sees {}, B sees {}", a_count, b_count);
    println!("  (B heard it twice: broadcast + feed. The merge kept one copy.)");

    tab_b.delete_bookmark(&added.id).await.unwrap();
    settle().await;
    println!(
        "  Tab B deleted it; A now sees {} entry(ies)",
        tab_a.snapshot().await.bookmarks.len()
    );

    tab_a.detach();
    tab_b.detach();
    println!("  ✓ TabBus + FeedHub OK");
    println!();
}

fn demo_auth_gateway() {
    use std::sync::Arc;
    use marksync::backend::http::BackendClient;
    use marksync::services::auth::{AuthGateway, AuthGatewayTrait};
    section("Auth Gateway");

    let client = BackendClient::new("https://demo.example.co", "publishable-key", None)
        .expect("demo backend config is valid");
    let gateway = AuthGateway::new(Arc::new(client));
    let url = gateway.authorize_url("google", "https://app.example.com/auth/callback");
    println!("  Third-party sign-in starts at:");
    println!("    {}", url);
    println!("  (No network in the demo; tokens come back via the redirect.)");
    println!("  ✓ AuthGateway OK");
    println!();
}

async fn demo_app_core() {
    use marksync::app::App;
    section("App Core");

    let mut app = App::with_memory();
    println!("  Backend: {}", app.backend_kind());

    let list = app.start_session(demo_user("grace", "Grace Hopper")).await;
    list.set_drafts(Some("Compilers"), Some("example.com/compilers")).await;
    list.add_bookmark().await.unwrap();
    println!(
        "  Session for {} holds {} bookmark(s)",
        list.user().id,
        list.snapshot().await.bookmarks.len()
    );

    // Replacing the session detaches the old one.
    let list = app.start_session(demo_user("ada", "Ada Lovelace")).await;
    println!(
        "  Switched user; fresh session starts with {} bookmark(s)",
        list.snapshot().await.bookmarks.len()
    );

    app.stop_session();
    println!("  Session stopped");
    println!("  ✓ App Core OK");
    println!();
}
