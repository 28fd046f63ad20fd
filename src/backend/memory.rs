//! In-process backend for marksync.
//!
//! A record store plus live change feed with the same observable contract as
//! the remote pair, used by the demo and tests and whenever no remote backend
//! is configured. Successful mutations publish to the feed, including the
//! writer's own, so callers see the duplicate deliveries the real feed
//! produces.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::backend::feed::{ChangeFeed, FeedHub, FeedSubscription};
use crate::backend::records::RecordStore;
use crate::types::bookmark::{Bookmark, NewBookmark};
use crate::types::errors::{FeedError, StoreError};
use crate::types::event::BookmarkEvent;

pub struct MemoryBackend {
    table: String,
    rows: RwLock<Vec<Bookmark>>,
    hub: Arc<FeedHub>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_table("bookmarks")
    }

    pub fn with_table(table: &str) -> Self {
        Self {
            table: table.to_string(),
            rows: RwLock::default(),
            hub: Arc::new(FeedHub::new()),
        }
    }

    /// The hub this backend publishes change events to.
    pub fn hub(&self) -> Arc<FeedHub> {
        self.hub.clone()
    }

    /// Total rows across all owners.
    pub async fn row_count(&self) -> usize {
        self.rows.read().await.len()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryBackend {
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Bookmark>, StoreError> {
        let rows = self.rows.read().await;
        let mut owned: Vec<Bookmark> = rows
            .iter()
            .filter(|bm| bm.user_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn insert(&self, record: NewBookmark) -> Result<Bookmark, StoreError> {
        let bookmark = Bookmark {
            id: Uuid::new_v4().to_string(),
            url: record.url,
            title: record.title,
            created_at: Utc::now(),
            user_id: record.user_id,
        };
        self.rows.write().await.push(bookmark.clone());
        self.hub
            .publish(
                &self.table,
                &bookmark.user_id,
                BookmarkEvent::Added {
                    bookmark: bookmark.clone(),
                },
            )
            .await;
        Ok(bookmark)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let removed = {
            let mut rows = self.rows.write().await;
            match rows.iter().position(|bm| bm.id == id) {
                Some(index) => Some(rows.remove(index)),
                None => None,
            }
        };
        // Absent ids delete cleanly and emit nothing.
        if let Some(bookmark) = removed {
            self.hub
                .publish(
                    &self.table,
                    &bookmark.user_id,
                    BookmarkEvent::Deleted { id: bookmark.id },
                )
                .await;
        }
        Ok(())
    }
}

#[async_trait]
impl ChangeFeed for MemoryBackend {
    async fn subscribe(
        &self,
        table: &str,
        owner_id: &str,
    ) -> Result<FeedSubscription, FeedError> {
        self.hub.subscribe(table, owner_id).await
    }
}
