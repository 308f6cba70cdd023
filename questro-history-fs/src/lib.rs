#![deny(missing_docs)]
//! File-backed implementation of the [`HistoryStore`] trait.
//!
//! All records, for every user, live in one JSON array on disk. The file is
//! read once at open and rewritten in full on every mutation, so it always
//! reflects the last completed operation.

use async_trait::async_trait;
use questro_types::{
    CHAT_KIND, ChatRecord, HistoryStore, Message, StoreError, sort_newest_first,
};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Default file name for the history document.
pub const DEFAULT_FILE_NAME: &str = "questro_chat_history.json";

/// Filesystem-backed history store.
///
/// Layout:
/// ```text
/// <path>      JSON array of records, newest first
/// <path>.tmp  scratch file, renamed over <path> on every write
/// ```
///
/// A file that fails to parse is treated as empty; the next mutation
/// overwrites it.
pub struct FsHistory {
    path: PathBuf,
    records: Mutex<Vec<ChatRecord>>,
}

impl FsHistory {
    /// Open the store at `path`, loading existing records.
    ///
    /// A missing file is an empty store. The file and its parent directory are
    /// created lazily on first write.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let records = load(&path).await?;
        tracing::debug!(path = %path.display(), records = records.len(), "opened chat history");
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    /// Location of the history document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to a copy of the records, persist it, then commit.
    ///
    /// Nothing changes in memory if the write fails.
    async fn mutate<T, F>(&self, change: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Vec<ChatRecord>) -> Result<T, StoreError>,
    {
        let mut records = self.records.lock().await;
        let mut next = records.clone();
        let result = change(&mut next)?;
        sort_newest_first(&mut next);
        persist(&self.path, &next).await?;
        *records = next;
        Ok(result)
    }
}

async fn load(path: &Path) -> Result<Vec<ChatRecord>, StoreError> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StoreError::Io(e.to_string())),
    };
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str::<Vec<ChatRecord>>(&contents) {
        Ok(records) => Ok(records),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "chat history unreadable, starting empty");
            Ok(Vec::new())
        }
    }
}

async fn persist(path: &Path, records: &[ChatRecord]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
    }
    let contents = serde_json::to_string_pretty(records)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;

    let mut scratch = path.as_os_str().to_owned();
    scratch.push(".tmp");
    let scratch = PathBuf::from(scratch);
    tokio::fs::write(&scratch, contents)
        .await
        .map_err(|e| StoreError::Io(e.to_string()))?;
    tokio::fs::rename(&scratch, path)
        .await
        .map_err(|e| StoreError::Io(e.to_string()))?;
    Ok(())
}

fn find_owned<'a>(
    records: &'a mut [ChatRecord],
    user_id: &str,
    id: &str,
) -> Result<&'a mut ChatRecord, StoreError> {
    records
        .iter_mut()
        .find(|r| r.id == id && r.user_id == user_id)
        .ok_or_else(|| StoreError::not_found(user_id, id))
}

#[async_trait]
impl HistoryStore for FsHistory {
    async fn create(
        &self,
        user_id: &str,
        title: &str,
        messages: &[Message],
    ) -> Result<ChatRecord, StoreError> {
        let record = ChatRecord::new(user_id, title, messages);
        let stored = record.clone();
        self.mutate(move |records| {
            records.insert(0, stored);
            Ok(())
        })
        .await?;
        tracing::info!(id = %record.id, "chat saved");
        Ok(record)
    }

    async fn get(&self, user_id: &str, id: &str) -> Result<Option<ChatRecord>, StoreError> {
        let records = self.records.lock().await;
        Ok(records
            .iter()
            .find(|r| r.id == id && r.user_id == user_id)
            .cloned())
    }

    async fn list(&self, user_id: &str) -> Result<Vec<ChatRecord>, StoreError> {
        let records = self.records.lock().await;
        let mut owned: Vec<ChatRecord> = records
            .iter()
            .filter(|r| r.user_id == user_id && r.kind == CHAT_KIND)
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
        self.mutate(|records| {
            find_owned(records, user_id, id)?.set_messages(messages);
            Ok(())
        })
        .await?;
        tracing::info!(%id, "chat updated");
        Ok(())
    }

    async fn rename(&self, user_id: &str, id: &str, title: &str) -> Result<(), StoreError> {
        self.mutate(|records| {
            find_owned(records, user_id, id)?.set_title(title);
            Ok(())
        })
        .await
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<(), StoreError> {
        self.mutate(|records| {
            records.retain(|r| !(r.id == id && r.user_id == user_id));
            Ok(())
        })
        .await
    }

    async fn clear(&self, user_id: &str) -> Result<(), StoreError> {
        self.mutate(|records| {
            records.retain(|r| r.user_id != user_id);
            Ok(())
        })
        .await?;
        tracing::info!(%user_id, "chat history cleared");
        Ok(())
    }
}
