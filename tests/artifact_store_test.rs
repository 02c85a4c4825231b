use kobzar::application::ports::{ArtifactStore, ArtifactStoreError};
use kobzar::domain::TaskId;
use kobzar::infrastructure::storage::{InMemoryArtifactStore, LocalArtifactStore};

fn create_local_store() -> (tempfile::TempDir, LocalArtifactStore) {
    let dir = tempfile::TempDir::new().unwrap();
    let store = LocalArtifactStore::new(dir.path().to_path_buf()).unwrap();
    (dir, store)
}

#[tokio::test]
async fn given_stored_artifact_when_fetching_then_bytes_match() {
    let (_dir, store) = create_local_store();
    let task_id = TaskId::new();
    let filename = format!("transcription_{}.txt", task_id);

    store
        .put(task_id, &filename, "привіт світ".as_bytes())
        .await
        .unwrap();

    let fetched = store.fetch(task_id, &filename).await.unwrap();
    assert_eq!(fetched, "привіт світ".as_bytes());
}

#[tokio::test]
async fn given_missing_artifact_when_fetching_then_not_found() {
    let (_dir, store) = create_local_store();
    let result = store.fetch(TaskId::new(), "transcription_missing.txt").await;
    assert!(matches!(result, Err(ArtifactStoreError::NotFound(_))));
}

#[tokio::test]
async fn given_memory_store_when_putting_twice_then_last_write_wins() {
    let store = InMemoryArtifactStore::new();
    let task_id = TaskId::new();

    store.put(task_id, "a.txt", b"first").await.unwrap();
    store.put(task_id, "a.txt", b"second").await.unwrap();

    assert_eq!(store.fetch(task_id, "a.txt").await.unwrap(), b"second");
}
