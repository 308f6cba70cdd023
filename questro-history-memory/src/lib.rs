#![deny(missing_docs)]
//! In-memory implementation of the [`HistoryStore`] trait.
//!
//! Records live in a `HashMap` keyed by id behind a `RwLock`. Every
//! operation filters by owning user, so one user's records are never
//! visible to another. Nothing survives the process.

use async_trait::async_trait;
use questro_types::{
    CHAT_KIND, ChatRecord, HistoryStore, Message, StoreError, sort_newest_first,
};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory history store.
///
/// Suitable for tests and for sessions run with history disabled.
pub struct MemoryHistory {
    records: RwLock<HashMap<String, ChatRecord>>,
}

impl MemoryHistory {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

fn owned_by<'a>(record: &'a mut ChatRecord, user_id: &str) -> Option<&'a mut ChatRecord> {
    (record.user_id == user_id).then_some(record)
}

#[async_trait]
impl HistoryStore for MemoryHistory {
    async fn create(
        &self,
        user_id: &str,
        title: &str,
        messages: &[Message],
    ) -> Result<ChatRecord, StoreError> {
        let record = ChatRecord::new(user_id, title, messages);
        let mut records = self.records.write().await;
        records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn get(&self, user_id: &str, id: &str) -> Result<Option<ChatRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .get(id)
            .filter(|record| record.user_id == user_id)
            .cloned())
    }

    async fn list(&self, user_id: &str) -> Result<Vec<ChatRecord>, StoreError> {
        let records = self.records.read().await;
        let mut owned: Vec<ChatRecord> = records
            .values()
            .filter(|record| record.user_id == user_id && record.kind == CHAT_KIND)
            .cloned()
            .collect();
        sort_newest_first(&mut owned);
        Ok(owned)
    }

    async fn update_messages(
        &self,
        user_id: &str,
        id: &str,
        messages: &[Message],
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .and_then(|record| owned_by(record, user_id))
            .ok_or_else(|| StoreError::not_found(user_id, id))?;
        record.set_messages(messages);
        Ok(())
    }

    async fn rename(&self, user_id: &str, id: &str, title: &str) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .and_then(|record| owned_by(record, user_id))
            .ok_or_else(|| StoreError::not_found(user_id, id))?;
        record.set_title(title);
        Ok(())
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        if records.get(id).is_some_and(|record| record.user_id == user_id) {
            records.remove(id);
        }
        Ok(())
    }

    async fn clear(&self, user_id: &str) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        records.retain(|_, record| record.user_id != user_id);
        Ok(())
    }
}
