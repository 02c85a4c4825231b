use std::path::PathBuf;
use std::sync::Arc;

use object_store::local::LocalFileSystem;
use object_store::path::Path as StorePath;
use object_store::{ObjectStore, PutPayload};

use crate::application::ports::{ArtifactStore, ArtifactStoreError};
use crate::domain::TaskId;

/// Filesystem-backed artifact store; artifacts land under
/// `<base>/<task_id>/<filename>`.
pub struct LocalArtifactStore {
    inner: Arc<LocalFileSystem>,
}

impl LocalArtifactStore {
    pub fn new(base_path: PathBuf) -> Result<Self, ArtifactStoreError> {
        std::fs::create_dir_all(&base_path).map_err(ArtifactStoreError::Io)?;
        let fs = LocalFileSystem::new_with_prefix(base_path)
            .map_err(|e| ArtifactStoreError::WriteFailed(e.to_string()))?;
        Ok(Self {
            inner: Arc::new(fs),
        })
    }

    fn store_path(task_id: TaskId, filename: &str) -> StorePath {
        StorePath::from(format!("{}/{}", task_id, filename))
    }
}

#[async_trait::async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn put(
        &self,
        task_id: TaskId,
        filename: &str,
        data: &[u8],
    ) -> Result<(), ArtifactStoreError> {
        let path = Self::store_path(task_id, filename);
        self.inner
            .put(&path, PutPayload::from(data.to_vec()))
            .await
            .map_err(|e| ArtifactStoreError::WriteFailed(e.to_string()))?;
        Ok(())
    }

    async fn fetch(&self, task_id: TaskId, filename: &str) -> Result<Vec<u8>, ArtifactStoreError> {
        let path = Self::store_path(task_id, filename);
        let result = self
            .inner
            .get(&path)
            .await
            .map_err(|e| ArtifactStoreError::NotFound(e.to_string()))?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| ArtifactStoreError::NotFound(e.to_string()))?;

        Ok(bytes.to_vec())
    }
}
