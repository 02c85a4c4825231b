use async_trait::async_trait;

use crate::domain::TaskId;

/// Storage for transcript artifacts attached to tasks.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn put(
        &self,
        task_id: TaskId,
        filename: &str,
        data: &[u8],
    ) -> Result<(), ArtifactStoreError>;

    async fn fetch(&self, task_id: TaskId, filename: &str) -> Result<Vec<u8>, ArtifactStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactStoreError {
    #[error("write failed: {0}")]
    WriteFailed(String),
    #[error("artifact not found: {0}")]
    NotFound(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
