use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::Instrument;

use crate::application::config::{ProcessingConfig, ProcessingMode};
use crate::application::ports::{
    ArtifactStore, DispatchTrigger, RepositoryError, TaskRepository, TranscriptionEngine,
};
use crate::domain::{AudioTask, TaskId, Transcript};

const MAX_SAVE_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Upper bound on one provider call. Whisper takes seconds to tens of
/// seconds; without a bound a stuck call would hold the single-flight slot
/// forever, and there is no watchdog to reclaim it.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(330);

/// Executes one claimed task off the dispatcher's path and persists the
/// outcome, retrying the success save on storage write-conflicts.
pub struct JobExecutor {
    repository: Arc<dyn TaskRepository>,
    engine: Arc<dyn TranscriptionEngine>,
    artifacts: Arc<dyn ArtifactStore>,
    config: Arc<ProcessingConfig>,
    trigger: Arc<dyn DispatchTrigger>,
    provider_timeout: Duration,
    retry_base_delay: Duration,
}

impl JobExecutor {
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
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
            retry_base_delay: RETRY_BASE_DELAY,
        }
    }

    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    /// Run the task to completion or failure, then self-retrigger under
    /// Immediate mode. Never propagates to the trigger caller: the dispatch
    /// call that spawned us already returned.
    pub async fn run(&self, task: AudioTask) {
        let span = tracing::info_span!(
            "transcription_job",
            task_id = %task.id,
            filename = task.audio.as_ref().map(|a| a.filename.as_str()),
        );
        async {
            if let Err(e) = self.execute(&task).await {
                tracing::error!(
                    error = %e,
                    "Failed to persist job outcome; task may be left in transcribing state"
                );
            }
        }
        .instrument(span)
        .await;

        if self.config.mode == ProcessingMode::Immediate {
            self.trigger.request_cycle().await;
        }
    }

    async fn execute(&self, task: &AudioTask) -> Result<(), ExecutorError> {
        let Some(audio) = task.audio.as_ref() else {
            // Claimed without a payload: enqueue validation should make this
            // impossible, but the row is mutable by other actors.
            self.persist_failure(task.id, "audio payload is missing").await?;
            return Ok(());
        };

        let started = Instant::now();
        let language = self.config.language.as_str();
        tracing::info!(language, "Transcription started");

        let call = self
            .engine
            .transcribe(audio.data.as_ref(), &audio.filename, Some(language));

        match tokio::time::timeout(self.provider_timeout, call).await {
            Ok(Ok(text)) if !text.trim().is_empty() => {
                let transcript =
                    Transcript::new(text.trim().to_string(), task.id, started.elapsed());
                tracing::info!(
                    elapsed_secs = transcript.elapsed.as_secs_f64(),
                    chars = transcript.text.len(),
                    "Transcription completed"
                );
                self.persist_completion(task.id, &transcript).await
            }
            Ok(Ok(_)) => {
                self.persist_failure(task.id, "empty transcription received")
                    .await
            }
            Ok(Err(e)) => self.persist_failure(task.id, &e.to_string()).await,
            Err(_) => {
                self.persist_failure(
                    task.id,
                    &format!(
                        "transcription timed out after {}s",
                        self.provider_timeout.as_secs()
                    ),
                )
                .await
            }
        }
    }

    /// Save the Done outcome with bounded retry on write-conflicts: up to 3
    /// attempts with linearly increasing backoff. Any other storage error, or
    /// exhausting the attempts, is fatal for the save.
    async fn persist_completion(
        &self,
        id: TaskId,
        transcript: &Transcript,
    ) -> Result<(), ExecutorError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.repository.save_completion(id, transcript).await {
                Ok(true) => break,
                Ok(false) => {
                    // Task was deleted while transcribing; drop the result.
                    tracing::warn!(task_id = %id, "Task vanished before outcome save");
                    return Ok(());
                }
                Err(e) if e.is_conflict() && attempt < MAX_SAVE_ATTEMPTS => {
                    tracing::warn!(task_id = %id, attempt, error = %e, "Outcome save conflict, retrying");
                    tokio::time::sleep(self.retry_base_delay * attempt).await;
                }
                Err(e) => return Err(ExecutorError::Repository(e)),
            }
        }

        if let Err(e) = self
            .artifacts
            .put(
                id,
                &transcript.result_filename,
                transcript.text.as_bytes(),
            )
            .await
        {
            // The outcome itself is saved; a missing attachment is not worth
            // failing the task over.
            tracing::warn!(task_id = %id, error = %e, "Failed to store transcript artifact");
        }

        Ok(())
    }

    async fn persist_failure(&self, id: TaskId, message: &str) -> Result<(), ExecutorError> {
        tracing::warn!(task_id = %id, error = message, "Transcription failed");
        match self.repository.save_failure(id, message).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                tracing::warn!(task_id = %id, "Task vanished before error save");
                Ok(())
            }
            Err(e) => Err(ExecutorError::Repository(e)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
}
