use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::application::ports::{RepositoryError, TaskRepository};
use crate::domain::{AudioTask, TaskId, TaskState, Transcript};

/// In-memory task store for tests and credential-less local runs.
///
/// All conditional writes happen under one mutex, which gives the same
/// atomicity the Postgres adapter gets from conditional UPDATEs.
#[derive(Default)]
pub struct InMemoryTaskRepository {
    tasks: Mutex<HashMap<TaskId, AudioTask>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<TaskId, AudioTask>> {
        // Poisoning only happens if a holder panicked; the map is still valid.
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn pending_ids_fifo(tasks: &HashMap<TaskId, AudioTask>) -> Vec<TaskId> {
        let mut pending: Vec<&AudioTask> = tasks
            .values()
            .filter(|t| t.state == TaskState::Pending)
            .collect();
        pending.sort_by_key(|t| (t.created_at, t.id));
        pending.iter().map(|t| t.id).collect()
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn create(&self, task: &AudioTask) -> Result<(), RepositoryError> {
        self.lock().insert(task.id, task.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: TaskId) -> Result<Option<AudioTask>, RepositoryError> {
        Ok(self.lock().get(&id).cloned())
    }

    async fn update(&self, task: &AudioTask) -> Result<(), RepositoryError> {
        let mut tasks = self.lock();
        if !tasks.contains_key(&task.id) {
            return Err(RepositoryError::NotFound(task.id.to_string()));
        }
        tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn delete(&self, id: TaskId) -> Result<(), RepositoryError> {
        self.lock().remove(&id);
        Ok(())
    }

    async fn list_by_state(&self, state: TaskState) -> Result<Vec<AudioTask>, RepositoryError> {
        let mut tasks: Vec<AudioTask> = self
            .lock()
            .values()
            .filter(|t| t.state == state)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| (t.created_at, t.id));
        Ok(tasks)
    }

    async fn has_transcribing(&self) -> Result<bool, RepositoryError> {
        Ok(self
            .lock()
            .values()
            .any(|t| t.state == TaskState::Transcribing))
    }

    async fn next_pending(&self) -> Result<Option<AudioTask>, RepositoryError> {
        let tasks = self.lock();
        let next = tasks
            .values()
            .filter(|t| t.state == TaskState::Pending)
            .min_by_key(|t| (t.created_at, t.id))
            .cloned();
        Ok(next)
    }

    async fn pending_position(&self, id: TaskId) -> Result<Option<usize>, RepositoryError> {
        let tasks = self.lock();
        Ok(Self::pending_ids_fifo(&tasks)
            .iter()
            .position(|t| *t == id)
            .map(|idx| idx + 1))
    }

    async fn claim_for_transcription(&self, id: TaskId) -> Result<bool, RepositoryError> {
        let mut tasks = self.lock();
        // The single-flight check and the state flip must be one atomic step:
        // a dispatch cycle's earlier `has_transcribing` answer may be stale by
        // the time it claims.
        if tasks.values().any(|t| t.state == TaskState::Transcribing) {
            return Ok(false);
        }
        match tasks.get_mut(&id) {
            Some(task) => Ok(task.start_transcribing()),
            None => Ok(false),
        }
    }

    async fn save_completion(
        &self,
        id: TaskId,
        transcript: &Transcript,
    ) -> Result<bool, RepositoryError> {
        let mut tasks = self.lock();
        match tasks.get_mut(&id) {
            Some(task) => {
                task.complete(transcript.clone());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn save_failure(
        &self,
        id: TaskId,
        error_message: &str,
    ) -> Result<bool, RepositoryError> {
        let mut tasks = self.lock();
        match tasks.get_mut(&id) {
            Some(task) => {
                task.fail(error_message);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
