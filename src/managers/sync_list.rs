//! Bookmark sync list for marksync.
//!
//! Holds one user's bookmarks as a de-duplicated, newest-first in-memory
//! list under three mutation sources: direct calls from the owning view, the
//! remote change feed, and the cross-tab broadcast bus. Every path funnels
//! through [`apply_event`], so duplicated and reordered deliveries across the
//! two live channels cannot corrupt the list.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::backend::broadcast::{bookmarks_channel, TabBus, TabReceiver};
use crate::backend::feed::{ChangeFeed, FeedSubscription};
use crate::backend::records::RecordStore;
use crate::types::bookmark::{normalize_url, Bookmark, NewBookmark};
use crate::types::errors::StoreError;
use crate::types::event::BookmarkEvent;
use crate::types::user::AuthUser;

/// Observable state of the list. Cloned out as a snapshot for hosts to render.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ListState {
    pub bookmarks: Vec<Bookmark>,
    /// True only during the initial fetch.
    pub loading: bool,
    /// True while a submitted bookmark is being persisted.
    pub adding: bool,
    /// Identifier of the entry being deleted, while the backend call runs.
    pub deleting_id: Option<String>,
    pub form_open: bool,
    pub draft_title: String,
    pub draft_url: String,
}

/// Merges one event into the list.
///
/// An added record already present by identifier is left alone (duplicate
/// delivery, or our own write echoed back); a new one is prepended, since
/// every source produces the newest record. Deletes remove by identifier and
/// ignore absent ids.
pub fn apply_event(bookmarks: &mut Vec<Bookmark>, event: &BookmarkEvent) {
    match event {
        BookmarkEvent::Added { bookmark } => {
            if bookmarks.iter().any(|existing| existing.id == bookmark.id) {
                return;
            }
            bookmarks.insert(0, bookmark.clone());
        }
        BookmarkEvent::Deleted { id } => {
            bookmarks.retain(|existing| existing.id != *id);
        }
    }
}

/// One user's live bookmark list.
pub struct BookmarkSyncList {
    user: AuthUser,
    channel: String,
    store: Arc<dyn RecordStore>,
    bus: TabBus,
    state: Arc<RwLock<ListState>>,
    feed_task: Option<JoinHandle<()>>,
    bus_task: Option<JoinHandle<()>>,
}

impl BookmarkSyncList {
    /// Brings up the list for `user`: one authoritative fetch of their
    /// records, then the two live subscriptions. A failed fetch leaves the
    /// list empty; a failed feed subscription is logged and skipped, after
    /// which the list converges through the broadcast channel alone.
    pub async fn attach(
        user: AuthUser,
        store: Arc<dyn RecordStore>,
        feed: Arc<dyn ChangeFeed>,
        bus: TabBus,
        table: &str,
    ) -> Self {
        let channel = bookmarks_channel(&user.id);
        let state = Arc::new(RwLock::new(ListState {
            loading: true,
            ..ListState::default()
        }));

        match store.list_by_owner(&user.id).await {
            Ok(rows) => {
                let mut st = state.write().await;
                st.bookmarks = rows;
                st.loading = false;
            }
            Err(e) => {
                warn!("initial bookmark load failed for {}: {}", user.id, e);
                state.write().await.loading = false;
            }
        }

        let feed_task = match feed.subscribe(table, &user.id).await {
            Ok(subscription) => Some(spawn_feed_pump(state.clone(), subscription)),
            Err(e) => {
                warn!("change feed unavailable for {}: {}", user.id, e);
                None
            }
        };
        let receiver = bus.subscribe(&channel).await;
        let bus_task = Some(spawn_bus_pump(state.clone(), receiver));

        Self {
            user,
            channel,
            store,
            bus,
            state,
            feed_task,
            bus_task,
        }
    }

    pub fn user(&self) -> &AuthUser {
        &self.user
    }

    /// Channel this list announces its own writes on.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub async fn snapshot(&self) -> ListState {
        self.state.read().await.clone()
    }

    /// Updates the entry form drafts. `None` leaves a field unchanged.
    pub async fn set_drafts(&self, title: Option<&str>, url: Option<&str>) {
        let mut st = self.state.write().await;
        if let Some(title) = title {
            st.draft_title = title.to_string();
        }
        if let Some(url) = url {
            st.draft_url = url.to_string();
        }
    }

    pub async fn set_form_open(&self, open: bool) {
        self.state.write().await.form_open = open;
    }

    /// Submits the drafted bookmark.
    ///
    /// Blank title or URL (after trimming) makes this a no-op returning
    /// `Ok(None)`. On success the stored record is merged locally, announced
    /// to sibling tabs, and the form resets. On failure nothing changes and
    /// the drafts stay so the user can retry. The in-progress flag clears on
    /// every path.
    pub async fn add_bookmark(&self) -> Result<Option<Bookmark>, StoreError> {
        let (title, url) = {
            let st = self.state.read().await;
            (
                st.draft_title.trim().to_string(),
                st.draft_url.trim().to_string(),
            )
        };
        if title.is_empty() || url.is_empty() {
            return Ok(None);
        }

        self.state.write().await.adding = true;
        let result = self
            .store
            .insert(NewBookmark {
                url: normalize_url(&url),
                title,
                user_id: self.user.id.clone(),
            })
            .await;

        let outcome = match result {
            Ok(bookmark) => {
                let event = BookmarkEvent::Added {
                    bookmark: bookmark.clone(),
                };
                {
                    let mut st = self.state.write().await;
                    apply_event(&mut st.bookmarks, &event);
                    st.draft_title.clear();
                    st.draft_url.clear();
                    st.form_open = false;
                }
                self.bus.publish(&self.channel, event).await;
                Ok(Some(bookmark))
            }
            Err(e) => {
                warn!("bookmark insert failed for {}: {}", self.user.id, e);
                Err(e)
            }
        };

        self.state.write().await.adding = false;
        outcome
    }

    /// Deletes optimistically: the entry leaves local state and sibling tabs
    /// are told before the backend answers. A backend failure is logged and
    /// returned, but the local removal stands; a later fetch or feed event
    /// resurfaces the record if it still exists.
    pub async fn delete_bookmark(&self, id: &str) -> Result<(), StoreError> {
        let event = BookmarkEvent::Deleted { id: id.to_string() };
        {
            let mut st = self.state.write().await;
            st.deleting_id = Some(id.to_string());
            apply_event(&mut st.bookmarks, &event);
        }
        self.bus.publish(&self.channel, event).await;

        let result = self.store.delete(id).await;
        if let Err(ref e) = result {
            warn!("delete of {} failed, keeping local removal: {}", id, e);
        }

        self.state.write().await.deleting_id = None;
        result
    }

    /// Stops both live subscriptions. No event is applied after this returns.
    pub fn detach(&mut self) {
        if let Some(task) = self.feed_task.take() {
            task.abort();
        }
        if let Some(task) = self.bus_task.take() {
            task.abort();
        }
        debug!("detached bookmark list for {}", self.user.id);
    }
}

impl Drop for BookmarkSyncList {
    fn drop(&mut self) {
        self.detach();
    }
}

fn spawn_feed_pump(
    state: Arc<RwLock<ListState>>,
    mut subscription: FeedSubscription,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = subscription.next_event().await {
            let mut st = state.write().await;
            apply_event(&mut st.bookmarks, &event);
        }
        debug!("change feed closed for {}", subscription.owner_id());
    })
}

fn spawn_bus_pump(state: Arc<RwLock<ListState>>, mut receiver: TabReceiver) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let mut st = state.write().await;
                    apply_event(&mut st.bookmarks, &event);
                }
                Err(RecvError::Lagged(missed)) => {
                    // Best-effort channel: the skipped events are gone, later
                    // ones still arrive.
                    warn!(
                        "tab channel {} lagged, {} events dropped",
                        receiver.channel(),
                        missed
                    );
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
