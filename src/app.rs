//! App Core for marksync.
//!
//! Central struct wiring the backend collaborators and holding the active
//! list session. The backend pair (record store + feed hub) and the tab bus
//! are created once; the session is rebuilt whenever the user changes.

use std::sync::Arc;

use tracing::info;

use crate::backend::broadcast::TabBus;
use crate::backend::feed::{ChangeFeed, FeedHub};
use crate::backend::http::{BackendClient, HttpRecordStore};
use crate::backend::memory::MemoryBackend;
use crate::backend::records::RecordStore;
use crate::managers::sync_list::BookmarkSyncList;
use crate::services::auth::AuthGateway;
use crate::services::config::SyncConfig;
use crate::types::errors::{AuthError, ConfigError};
use crate::types::user::AuthUser;

/// Central application struct.
///
/// At most one [`BookmarkSyncList`] session is live at a time; starting a new
/// one detaches the old. With a remote backend the feed hub carries events
/// the hosting process republishes from the vendor's realtime stream; the
/// in-process backend publishes into the same hub directly.
pub struct App {
    config: SyncConfig,
    store: Arc<dyn RecordStore>,
    feed: Arc<FeedHub>,
    bus: TabBus,
    auth: Option<Arc<AuthGateway>>,
    session: Option<BookmarkSyncList>,
}

impl App {
    /// Creates an App from configuration: the remote backend when fully
    /// configured, the in-process backend otherwise.
    pub fn new(config: SyncConfig) -> Result<Self, ConfigError> {
        if !config.has_remote() {
            info!("no remote backend configured, using in-process backend");
            return Ok(Self::with_memory_config(config));
        }

        let (base_url, anon_key) = config.remote()?;
        let client = Arc::new(BackendClient::new(
            base_url,
            anon_key,
            config.access_token.as_deref(),
        )?);
        info!("using remote backend at {}", client.base_url());

        let store: Arc<dyn RecordStore> =
            Arc::new(HttpRecordStore::new(client.clone(), &config.table));
        let auth = Arc::new(AuthGateway::new(client));
        Ok(Self {
            config,
            store,
            feed: Arc::new(FeedHub::new()),
            bus: TabBus::new(),
            auth: Some(auth),
            session: None,
        })
    }

    /// In-process backend with default configuration. Used by the demo and
    /// tests.
    pub fn with_memory() -> Self {
        Self::with_memory_config(SyncConfig::default())
    }

    fn with_memory_config(config: SyncConfig) -> Self {
        let backend = Arc::new(MemoryBackend::with_table(&config.table));
        let feed = backend.hub();
        Self {
            config,
            store: backend,
            feed,
            bus: TabBus::new(),
            auth: None,
            session: None,
        }
    }

    /// Starts a list session for `user`, replacing any existing one.
    pub async fn start_session(&mut self, user: AuthUser) -> &BookmarkSyncList {
        self.stop_session();
        let feed: Arc<dyn ChangeFeed> = self.feed.clone();
        let list = BookmarkSyncList::attach(
            user,
            self.store.clone(),
            feed,
            self.bus.clone(),
            &self.config.table,
        )
        .await;
        self.session.insert(list)
    }

    /// Detaches the active session, if any.
    pub fn stop_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.detach();
        }
    }

    /// Ends the session and, when an auth gateway and token are present,
    /// revokes the session with the identity provider.
    pub async fn sign_out(&mut self, access_token: Option<&str>) -> Result<(), AuthError> {
        self.stop_session();
        if let (Some(auth), Some(token)) = (self.auth.clone(), access_token) {
            use crate::services::auth::AuthGatewayTrait;
            auth.sign_out(token).await?;
        }
        Ok(())
    }

    pub fn session(&self) -> Option<&BookmarkSyncList> {
        self.session.as_ref()
    }

    pub fn auth(&self) -> Option<Arc<AuthGateway>> {
        self.auth.clone()
    }

    pub fn feed(&self) -> Arc<FeedHub> {
        self.feed.clone()
    }

    pub fn bus(&self) -> TabBus {
        self.bus.clone()
    }

    pub fn table(&self) -> &str {
        &self.config.table
    }

    pub fn backend_kind(&self) -> &'static str {
        if self.auth.is_some() {
            "remote"
        } else {
            "memory"
        }
    }
}
