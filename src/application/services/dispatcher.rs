use std::sync::Arc;

use chrono::Utc;

use crate::application::config::ProcessingConfig;
use crate::application::ports::{
    ArtifactStore, DispatchTrigger, RepositoryError, TaskRepository, TranscriptionEngine,
};
use crate::domain::TaskId;

use super::job_executor::JobExecutor;
use super::window_policy::is_dispatch_allowed;

/// What a dispatch cycle did. Every variant except `Started` is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Scheduled mode and the current hour is outside the window.
    WindowClosed,
    /// A transcription is already in flight.
    Busy,
    /// No Pending task in the queue.
    Idle,
    /// A concurrent cycle claimed the selected task first.
    Lost,
    /// The task was claimed and handed to a detached executor.
    Started(TaskId),
}

/// Single-flight scheduler. `run_cycle` is the only entry point and is safe
/// to call concurrently: the existence check merely short-circuits, the
/// conditional claim in the repository is the true linearization point.
pub struct Dispatcher {
    repository: Arc<dyn TaskRepository>,
    engine: Arc<dyn TranscriptionEngine>,
    artifacts: Arc<dyn ArtifactStore>,
    config: Arc<ProcessingConfig>,
    trigger: Arc<dyn DispatchTrigger>,
}

impl Dispatcher {
    pub fn new(
        repository: Arc<dyn TaskRepository>,
        engine: Arc<dyn TranscriptionEngine>,
        artifacts: Arc<dyn ArtifactStore>,
        config: Arc<ProcessingConfig>,
        trigger: Arc<dyn DispatchTrigger>,
    ) -> Self {
        Self {
            repository,
            engine,
            artifacts,
            config,
            trigger,
        }
    }

    /// Run one dispatch cycle: gate on the processing window, enforce
    /// single-flight, claim the earliest Pending task and launch its
    /// execution. Returns without waiting for the execution to finish.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, RepositoryError> {
        if !is_dispatch_allowed(
            Utc::now(),
            self.config.mode,
            self.config.scheduled_hour_from,
            self.config.scheduled_hour_to,
        ) {
            tracing::debug!("Processing not allowed at this time, skipping");
            return Ok(CycleOutcome::WindowClosed);
        }

        if self.repository.has_transcribing().await? {
            tracing::debug!("Transcription already in progress, skipping");
            return Ok(CycleOutcome::Busy);
        }

        let Some(task) = self.repository.next_pending().await? else {
            return Ok(CycleOutcome::Idle);
        };

        let claimed = match self.repository.claim_for_transcription(task.id).await {
            Ok(claimed) => claimed,
            // A conflicting writer got there first; same as losing the claim.
            Err(e) if e.is_conflict() => false,
            Err(e) => return Err(e),
        };
        if !claimed {
            tracing::debug!(task_id = %task.id, "Task claimed by a concurrent cycle");
            return Ok(CycleOutcome::Lost);
        }

        let id = task.id;
        tracing::info!(task_id = %id, "Dispatching task from queue");

        let executor = JobExecutor::new(
            Arc::clone(&self.repository),
            Arc::clone(&self.engine),
            Arc::clone(&self.artifacts),
            Arc::clone(&self.config),
            Arc::clone(&self.trigger),
        );
        tokio::spawn(async move {
            executor.run(task).await;
        });

        Ok(CycleOutcome::Started(id))
    }
}
