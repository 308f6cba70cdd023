use questro_history_fs::{DEFAULT_FILE_NAME, FsHistory};
use questro_types::{Attachment, HistoryStore, Message, StoreError};

fn exchange(question: &str, answer: &str) -> Vec<Message> {
    vec![Message::user(question), Message::assistant(answer)]
}

// --- Basic CRUD ---

#[tokio::test]
async fn create_then_get() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsHistory::open(dir.path().join(DEFAULT_FILE_NAME))
        .await
        .unwrap();

    let record = store
        .create("u1", "Derivatives", &exchange("d/dx x^2?", "2x"))
        .await
        .unwrap();
    let fetched = store.get("u1", &record.id).await.unwrap();
    assert_eq!(fetched, Some(record));
}

#[tokio::test]
async fn missing_file_opens_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsHistory::open(dir.path().join("absent.json")).await.unwrap();
    assert!(store.list("u1").await.unwrap().is_empty());
    assert!(!store.path().exists());
}

#[tokio::test]
async fn update_and_rename_unknown_are_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsHistory::open(dir.path().join(DEFAULT_FILE_NAME))
        .await
        .unwrap();

    let err = store
        .update_messages("u1", "nope", &exchange("a", "b"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));

    let err = store.rename("u1", "nope", "t").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[tokio::test]
async fn delete_missing_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsHistory::open(dir.path().join(DEFAULT_FILE_NAME))
        .await
        .unwrap();
    store.delete("u1", "nonexistent").await.unwrap();
}

// --- Persistence across reopen ---

#[tokio::test]
async fn records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DEFAULT_FILE_NAME);

    let id = {
        let store = FsHistory::open(&path).await.unwrap();
        let record = store.create("u1", "first", &exchange("q", "a")).await.unwrap();
        store
            .update_messages("u1", &record.id, &exchange("q2", "a2"))
            .await
            .unwrap();
        store.rename("u1", &record.id, "renamed").await.unwrap();
        record.id
    };

    let reopened = FsHistory::open(&path).await.unwrap();
    let record = reopened.get("u1", &id).await.unwrap().unwrap();
    assert_eq!(record.title, "renamed");
    assert_eq!(record.messages, exchange("q2", "a2"));
}

#[tokio::test]
async fn attachments_never_reach_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DEFAULT_FILE_NAME);
    let store = FsHistory::open(&path).await.unwrap();

    let messages = vec![
        Message::user("What is in this picture?")
            .with_attachment(Attachment::new("c2VjcmV0LWJ5dGVz", "image/jpeg")),
        Message::assistant("A graph."),
    ];
    store.create("u1", "Picture", &messages).await.unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(!raw.contains("c2VjcmV0LWJ5dGVz"));
    assert!(!raw.contains("image/jpeg"));
    assert!(raw.contains("What is in this picture?"));
}

#[tokio::test]
async fn file_is_a_json_array_with_type_tag() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DEFAULT_FILE_NAME);
    let store = FsHistory::open(&path).await.unwrap();
    store.create("u1", "t", &exchange("q", "a")).await.unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let first = &value.as_array().unwrap()[0];
    assert_eq!(first["type"], "chat");
    assert_eq!(first["messages"][0]["role"], "user");
}

#[tokio::test]
async fn corrupt_file_is_treated_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DEFAULT_FILE_NAME);
    std::fs::write(&path, "{ not json").unwrap();

    let store = FsHistory::open(&path).await.unwrap();
    assert!(store.list("u1").await.unwrap().is_empty());

    // The next write replaces the corrupt document.
    store.create("u1", "fresh", &[]).await.unwrap();
    let reopened = FsHistory::open(&path).await.unwrap();
    assert_eq!(reopened.list("u1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn parent_directory_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("deeper").join(DEFAULT_FILE_NAME);
    let store = FsHistory::open(&path).await.unwrap();
    store.create("u1", "t", &[]).await.unwrap();
    assert!(path.exists());
}

// --- Ordering and isolation ---

#[tokio::test]
async fn list_is_newest_first_after_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DEFAULT_FILE_NAME);
    let store = FsHistory::open(&path).await.unwrap();

    let old = store.create("u1", "old", &[]).await.unwrap();
    store.create("u1", "new", &[]).await.unwrap();
    store
        .update_messages("u1", &old.id, &exchange("bump", "ok"))
        .await
        .unwrap();

    let reopened = FsHistory::open(&path).await.unwrap();
    let titles: Vec<String> = reopened
        .list("u1")
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.title)
        .collect();
    assert_eq!(titles, vec!["old", "new"]);
}

#[tokio::test]
async fn clear_removes_only_that_user() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DEFAULT_FILE_NAME);
    let store = FsHistory::open(&path).await.unwrap();

    store.create("alice", "a", &[]).await.unwrap();
    let bobs = store.create("bob", "b", &[]).await.unwrap();
    store.clear("alice").await.unwrap();

    let reopened = FsHistory::open(&path).await.unwrap();
    assert!(reopened.list("alice").await.unwrap().is_empty());
    assert_eq!(reopened.list("bob").await.unwrap(), vec![bobs]);
}

#[tokio::test]
async fn other_users_cannot_read_or_delete() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsHistory::open(dir.path().join(DEFAULT_FILE_NAME))
        .await
        .unwrap();

    let record = store.create("alice", "private", &[]).await.unwrap();
    assert_eq!(store.get("bob", &record.id).await.unwrap(), None);
    store.delete("bob", &record.id).await.unwrap();
    assert!(store.get("alice", &record.id).await.unwrap().is_some());
}
