use std::collections::HashMap;
use std::sync::Mutex;

use crate::application::ports::{ArtifactStore, ArtifactStoreError};
use crate::domain::TaskId;

/// In-memory artifact store for tests.
#[derive(Default)]
pub struct InMemoryArtifactStore {
    artifacts: Mutex<HashMap<(TaskId, String), Vec<u8>>>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn put(
        &self,
        task_id: TaskId,
        filename: &str,
        data: &[u8],
    ) -> Result<(), ArtifactStoreError> {
        self.artifacts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert((task_id, filename.to_string()), data.to_vec());
        Ok(())
    }

    async fn fetch(&self, task_id: TaskId, filename: &str) -> Result<Vec<u8>, ArtifactStoreError> {
        self.artifacts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&(task_id, filename.to_string()))
            .cloned()
            .ok_or_else(|| ArtifactStoreError::NotFound(format!("{}/{}", task_id, filename)))
    }
}
