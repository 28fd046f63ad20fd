use serde::{Deserialize, Serialize};

use crate::types::bookmark::Bookmark;

/// One change to a user's bookmark set, as carried by both the remote change
/// feed and the cross-tab broadcast.
///
/// Wire shape: `{"type":"added","bookmark":{...}}` or
/// `{"type":"deleted","id":"..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BookmarkEvent {
    Added { bookmark: Bookmark },
    Deleted { id: String },
}
