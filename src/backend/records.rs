use async_trait::async_trait;

use crate::types::bookmark::{Bookmark, NewBookmark};
use crate::types::errors::StoreError;

/// Owner-scoped bookmark persistence.
///
/// Implementations do not keep per-caller state: every call names the record
/// or owner it touches, and `insert` hands back the stored record with its
/// backend-assigned identifier and timestamp.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records belonging to `owner_id`, newest first.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Bookmark>, StoreError>;

    /// Persists a new record and returns it as stored.
    async fn insert(&self, record: NewBookmark) -> Result<Bookmark, StoreError>;

    /// Removes a record by identifier. Deleting an absent id is not an error.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}
