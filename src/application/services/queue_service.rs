use std::sync::Arc;

use crate::application::config::{ProcessingConfig, ProcessingMode};
use crate::application::ports::{DispatchTrigger, RepositoryError, TaskRepository};
use crate::domain::{AudioFile, AudioTask, TaskError, TaskId};

/// User-facing queue operations: create, enqueue, cancel, reset.
///
/// Validation errors surface synchronously here; processing errors surface
/// asynchronously through the task's own state once the background job
/// completes.
pub struct QueueService {
    repository: Arc<dyn TaskRepository>,
    config: Arc<ProcessingConfig>,
    trigger: Arc<dyn DispatchTrigger>,
}

impl QueueService {
    pub fn new(
        repository: Arc<dyn TaskRepository>,
        config: Arc<ProcessingConfig>,
        trigger: Arc<dyn DispatchTrigger>,
    ) -> Self {
        Self {
            repository,
            config,
            trigger,
        }
    }

    /// Create a task in Draft with the uploaded payload.
    pub async fn create_task(
        &self,
        name: &str,
        audio: Option<AudioFile>,
    ) -> Result<AudioTask, QueueError> {
        let task = AudioTask::new(name, audio);
        self.repository.create(&task).await?;
        tracing::info!(task_id = %task.id, name = %task.name, "Task created");
        Ok(task)
    }

    /// Validate and move a task into the processing queue. Under Immediate
    /// mode a dispatch cycle is requested right away.
    pub async fn enqueue(&self, id: TaskId) -> Result<AudioTask, QueueError> {
        if !self.config.has_api_key() {
            return Err(QueueError::MissingApiKey);
        }

        let mut task = self.load(id).await?;
        task.enqueue()?;
        self.repository.update(&task).await?;
        tracing::info!(task_id = %task.id, "Task added to processing queue");

        if self.config.mode == ProcessingMode::Immediate {
            self.trigger.request_cycle().await;
        }

        Ok(task)
    }

    /// Remove a Pending task from the queue. No-op in any other state.
    pub async fn cancel(&self, id: TaskId) -> Result<AudioTask, QueueError> {
        let mut task = self.load(id).await?;
        if task.cancel() {
            self.repository.update(&task).await?;
            tracing::info!(task_id = %task.id, "Task removed from queue");
        }
        Ok(task)
    }

    /// Reset a task to Draft, clearing any previous outcome. Idempotent.
    pub async fn reset(&self, id: TaskId) -> Result<AudioTask, QueueError> {
        let mut task = self.load(id).await?;
        task.reset();
        self.repository.update(&task).await?;
        tracing::info!(task_id = %task.id, "Task reset to draft");
        Ok(task)
    }

    /// 1-based FIFO position among Pending tasks, None when not queued.
    pub async fn queue_position(&self, id: TaskId) -> Result<Option<usize>, QueueError> {
        Ok(self.repository.pending_position(id).await?)
    }

    async fn load(&self, id: TaskId) -> Result<AudioTask, QueueError> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(QueueError::NotFound(id))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("task not found: {0}")]
    NotFound(TaskId),
    #[error("please configure the OpenAI API key first")]
    MissingApiKey,
    #[error(transparent)]
    Validation(#[from] TaskError),
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
}
