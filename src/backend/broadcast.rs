//! Cross-tab broadcast bus for marksync.
//!
//! Same-machine views of one user's list announce their own writes here so
//! sibling tabs converge without waiting on the remote feed. Delivery is
//! best-effort: no subscribers means the event is dropped, and a receiver
//! that falls too far behind loses the oldest messages.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use crate::types::event::BookmarkEvent;

/// Per-channel buffer; receivers lagging past this many events drop the rest.
const CHANNEL_CAPACITY: usize = 32;

/// Channel name carrying one user's bookmark events. Every tab showing that
/// user's list subscribes to the same name.
pub fn bookmarks_channel(user_id: &str) -> String {
    format!("bookmarks-{}", user_id)
}

/// Fan-out bus addressed by channel name. Cloning shares the same channels.
#[derive(Clone)]
pub struct TabBus {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<BookmarkEvent>>>>,
}

impl TabBus {
    pub fn new() -> Self {
        Self {
            channels: Arc::new(RwLock::default()),
        }
    }

    /// Subscribes to a channel, creating it on first use.
    pub async fn subscribe(&self, channel: &str) -> TabReceiver {
        let channels = self.channels.read().await;
        if let Some(sender) = channels.get(channel) {
            return TabReceiver::new(channel.to_string(), self.clone(), sender.subscribe());
        }
        drop(channels);

        let mut channels = self.channels.write().await;
        let sender = channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        TabReceiver::new(channel.to_string(), self.clone(), sender.subscribe())
    }

    /// Posts an event and returns how many receivers got it. Zero receivers
    /// is a normal outcome, not an error.
    pub async fn publish(&self, channel: &str, event: BookmarkEvent) -> usize {
        let channels = self.channels.read().await;
        match channels.get(channel) {
            Some(sender) => sender.send(event).unwrap_or(0),
            None => 0,
        }
    }

    /// Drops a channel once its last receiver is gone. Called from the
    /// receiver's cleanup, which runs after the receiver itself has been
    /// dropped, so a count of zero means nobody is listening anymore.
    pub async fn close(&self, channel: &str) {
        let channels = self.channels.read().await;
        let receivers = channels
            .get(channel)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0);
        if receivers == 0 {
            drop(channels);
            self.channels.write().await.remove(channel);
            debug!("tab channel {} closed", channel);
        }
    }

    pub async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }
}

impl Default for TabBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving end of one channel; dropping it releases the subscription.
pub struct TabReceiver {
    channel: String,
    bus: TabBus,
    receiver: broadcast::Receiver<BookmarkEvent>,
}

impl TabReceiver {
    fn new(channel: String, bus: TabBus, receiver: broadcast::Receiver<BookmarkEvent>) -> Self {
        Self {
            channel,
            bus,
            receiver,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub async fn recv(&mut self) -> Result<BookmarkEvent, broadcast::error::RecvError> {
        self.receiver.recv().await
    }
}

impl Drop for TabReceiver {
    fn drop(&mut self) {
        let bus = self.bus.clone();
        let channel = self.channel.clone();
        tokio::spawn(async move {
            bus.close(&channel).await;
        });
    }
}
