//! The history persistence protocol.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::{ChatRecord, Message};

/// Persistence collaborator for finished exchanges.
///
/// Every operation is scoped by the owning user id; a record is invisible to
/// any other user. Messages are sanitized (attachments stripped) on every
/// write.
///
/// Implementations:
/// - `MemoryHistory`: `HashMap` behind a lock (tests, ephemeral sessions)
/// - `FsHistory`: a single JSON document on disk, rewritten on every mutation
///
/// Callers write once per completed exchange, never mid-stream.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Create a new record owned by `user_id` and return it.
    async fn create(
        &self,
        user_id: &str,
        title: &str,
        messages: &[Message],
    ) -> Result<ChatRecord, StoreError>;

    /// Read a record. Returns `None` if it does not exist for this user.
    async fn get(&self, user_id: &str, id: &str) -> Result<Option<ChatRecord>, StoreError>;

    /// All chat records of the user, newest `updated_at` first.
    async fn list(&self, user_id: &str) -> Result<Vec<ChatRecord>, StoreError>;

    /// Replace the messages of a record and bump `updated_at`.
    async fn update_messages(
        &self,
        user_id: &str,
        id: &str,
        messages: &[Message],
    ) -> Result<(), StoreError>;

    /// Change the title of a record and bump `updated_at`.
    async fn rename(&self, user_id: &str, id: &str, title: &str) -> Result<(), StoreError>;

    /// Delete a record. No-op if it does not exist.
    async fn delete(&self, user_id: &str, id: &str) -> Result<(), StoreError>;

    /// Delete every record owned by the user.
    async fn clear(&self, user_id: &str) -> Result<(), StoreError>;
}
