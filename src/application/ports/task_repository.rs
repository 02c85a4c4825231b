use async_trait::async_trait;

use crate::domain::{AudioTask, TaskId, TaskState, Transcript};

use super::RepositoryError;

/// Durable task storage.
///
/// `claim_for_transcription` and the two outcome saves are conditional
/// writes: the single-flight invariant rests on the storage layer making the
/// Pending→Transcribing transition atomic, not on an in-process lock.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, task: &AudioTask) -> Result<(), RepositoryError>;

    async fn get_by_id(&self, id: TaskId) -> Result<Option<AudioTask>, RepositoryError>;

    async fn update(&self, task: &AudioTask) -> Result<(), RepositoryError>;

    async fn delete(&self, id: TaskId) -> Result<(), RepositoryError>;

    async fn list_by_state(&self, state: TaskState) -> Result<Vec<AudioTask>, RepositoryError>;

    /// Whether any task is currently Transcribing.
    async fn has_transcribing(&self) -> Result<bool, RepositoryError>;

    /// Earliest-created Pending task, ties broken by id ascending.
    async fn next_pending(&self) -> Result<Option<AudioTask>, RepositoryError>;

    /// 1-based position among Pending tasks in FIFO order; None when the
    /// task is not pending.
    async fn pending_position(&self, id: TaskId) -> Result<Option<usize>, RepositoryError>;

    /// Conditionally move Pending→Transcribing. Returns false when the task
    /// was no longer Pending, or when some other task is already
    /// Transcribing; implementations must evaluate both conditions and the
    /// state flip as one atomic step.
    async fn claim_for_transcription(&self, id: TaskId) -> Result<bool, RepositoryError>;

    /// Persist a Done outcome. Returns false when the task no longer exists.
    async fn save_completion(
        &self,
        id: TaskId,
        transcript: &Transcript,
    ) -> Result<bool, RepositoryError>;

    /// Persist an Error outcome. Returns false when the task no longer exists.
    async fn save_failure(
        &self,
        id: TaskId,
        error_message: &str,
    ) -> Result<bool, RepositoryError>;
}
