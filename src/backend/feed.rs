//! Remote change feed for marksync.
//!
//! The managed backend pushes row changes to connected clients; this module
//! is the client-side seam for that stream. [`ChangeFeed`] hands out
//! owner-filtered subscriptions, and [`FeedHub`] is the in-process fan-out
//! behind them. With a remote backend the hosting process owns the vendor's
//! realtime connection and republishes every delivered event into the hub, so
//! the rest of the crate never sees the transport.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

use crate::types::errors::FeedError;
use crate::types::event::BookmarkEvent;

/// Source of live change events, scoped to one table and one owner per
/// subscription. Dropping the returned subscription unsubscribes.
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    async fn subscribe(&self, table: &str, owner_id: &str)
        -> Result<FeedSubscription, FeedError>;
}

/// A live feed subscription.
pub struct FeedSubscription {
    owner_id: String,
    events: mpsc::UnboundedReceiver<BookmarkEvent>,
}

impl FeedSubscription {
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Next event, or `None` once the feed has closed.
    pub async fn next_event(&mut self) -> Option<BookmarkEvent> {
        self.events.recv().await
    }
}

/// In-process change-feed hub.
///
/// Events are published under a table + owner key and delivered only to that
/// owner's subscribers, mirroring the row filter the real feed applies
/// server-side. Subscribers that went away are pruned on the next publish.
pub struct FeedHub {
    subscribers: RwLock<HashMap<String, Vec<mpsc::UnboundedSender<BookmarkEvent>>>>,
}

impl FeedHub {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::default(),
        }
    }

    fn key(table: &str, owner_id: &str) -> String {
        format!("{}:{}", table, owner_id)
    }

    /// Delivers an event to every live subscriber of this table and owner.
    pub async fn publish(&self, table: &str, owner_id: &str, event: BookmarkEvent) {
        let key = Self::key(table, owner_id);
        let mut subscribers = self.subscribers.write().await;
        if let Some(senders) = subscribers.get_mut(&key) {
            senders.retain(|tx| tx.send(event.clone()).is_ok());
            if senders.is_empty() {
                subscribers.remove(&key);
                debug!("feed key {} has no subscribers left, removed", key);
            }
        }
    }

    pub async fn subscriber_count(&self, table: &str, owner_id: &str) -> usize {
        let subscribers = self.subscribers.read().await;
        subscribers
            .get(&Self::key(table, owner_id))
            .map(|senders| senders.len())
            .unwrap_or(0)
    }
}

impl Default for FeedHub {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChangeFeed for FeedHub {
    async fn subscribe(
        &self,
        table: &str,
        owner_id: &str,
    ) -> Result<FeedSubscription, FeedError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let key = Self::key(table, owner_id);
        self.subscribers
            .write()
            .await
            .entry(key)
            .or_default()
            .push(tx);
        Ok(FeedSubscription {
            owner_id: owner_id.to_string(),
            events: rx,
        })
    }
}
