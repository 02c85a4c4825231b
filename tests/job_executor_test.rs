use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use kobzar::application::config::{ProcessingConfig, ProcessingMode};
use kobzar::application::ports::{
    ArtifactStore, DispatchTrigger, RepositoryError, TaskRepository, TranscriptionEngine,
    TranscriptionError,
};
use kobzar::application::services::JobExecutor;
use kobzar::domain::{AudioFile, AudioTask, TaskId, TaskState, Transcript};
use kobzar::infrastructure::persistence::InMemoryTaskRepository;
use kobzar::infrastructure::storage::InMemoryArtifactStore;

struct StubEngine {
    response: Result<&'static str, &'static str>,
    delay: Duration,
}

impl StubEngine {
    fn ok(transcript: &'static str) -> Self {
        Self {
            response: Ok(transcript),
            delay: Duration::ZERO,
        }
    }

    fn err(message: &'static str) -> Self {
        Self {
            response: Err(message),
            delay: Duration::ZERO,
        }
    }
}

#[async_trait::async_trait]
impl TranscriptionEngine for StubEngine {
    async fn transcribe(
        &self,
        _audio_data: &[u8],
        _filename: &str,
        _language: Option<&str>,
    ) -> Result<String, TranscriptionError> {
        tokio::time::sleep(self.delay).await;
        match self.response {
            Ok(text) => Ok(text.to_string()),
            Err(message) => Err(TranscriptionError::ApiRequestFailed(message.to_string())),
        }
    }
}

#[derive(Default)]
struct CountingTrigger {
    cycles: AtomicUsize,
}

#[async_trait::async_trait]
impl DispatchTrigger for CountingTrigger {
    async fn request_cycle(&self) {
        self.cycles.fetch_add(1, Ordering::SeqCst);
    }
}

/// Delegates to an in-memory store but reports a write-conflict for the
/// first `conflicts` completion saves, recording when each attempt ran.
struct ConflictingRepository {
    inner: InMemoryTaskRepository,
    conflicts: usize,
    attempts: Mutex<Vec<Instant>>,
}

impl ConflictingRepository {
    fn new(conflicts: usize) -> Self {
        Self {
            inner: InMemoryTaskRepository::new(),
            conflicts,
            attempts: Mutex::new(Vec::new()),
        }
    }

    fn attempt_times(&self) -> Vec<Instant> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl TaskRepository for ConflictingRepository {
    async fn create(&self, task: &AudioTask) -> Result<(), RepositoryError> {
        self.inner.create(task).await
    }

    async fn get_by_id(&self, id: TaskId) -> Result<Option<AudioTask>, RepositoryError> {
        self.inner.get_by_id(id).await
    }

    async fn update(&self, task: &AudioTask) -> Result<(), RepositoryError> {
        self.inner.update(task).await
    }

    async fn delete(&self, id: TaskId) -> Result<(), RepositoryError> {
        self.inner.delete(id).await
    }

    async fn list_by_state(
        &self,
        state: TaskState,
    ) -> Result<Vec<AudioTask>, RepositoryError> {
        self.inner.list_by_state(state).await
    }

    async fn has_transcribing(&self) -> Result<bool, RepositoryError> {
        self.inner.has_transcribing().await
    }

    async fn next_pending(&self) -> Result<Option<AudioTask>, RepositoryError> {
        self.inner.next_pending().await
    }

    async fn pending_position(&self, id: TaskId) -> Result<Option<usize>, RepositoryError> {
        self.inner.pending_position(id).await
    }

    async fn claim_for_transcription(&self, id: TaskId) -> Result<bool, RepositoryError> {
        self.inner.claim_for_transcription(id).await
    }

    async fn save_completion(
        &self,
        id: TaskId,
        transcript: &Transcript,
    ) -> Result<bool, RepositoryError> {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            attempts.push(Instant::now());
            attempts.len()
        };
        if attempt <= self.conflicts {
            return Err(RepositoryError::Conflict(
                "could not serialize access".to_string(),
            ));
        }
        self.inner.save_completion(id, transcript).await
    }

    async fn save_failure(
        &self,
        id: TaskId,
        error_message: &str,
    ) -> Result<bool, RepositoryError> {
        self.inner.save_failure(id, error_message).await
    }
}

struct Harness {
    repo: Arc<ConflictingRepository>,
    artifacts: Arc<InMemoryArtifactStore>,
    trigger: Arc<CountingTrigger>,
    executor: JobExecutor,
}

fn harness(engine: StubEngine, conflicts: usize, mode: ProcessingMode) -> Harness {
    let repo = Arc::new(ConflictingRepository::new(conflicts));
    let artifacts = Arc::new(InMemoryArtifactStore::new());
    let trigger = Arc::new(CountingTrigger::default());
    let config = Arc::new(ProcessingConfig {
        openai_api_key: Some("sk-test".to_string()),
        mode,
        ..ProcessingConfig::default()
    });
    let executor = JobExecutor::new(
        Arc::clone(&repo) as Arc<dyn TaskRepository>,
        Arc::new(engine) as Arc<dyn TranscriptionEngine>,
        Arc::clone(&artifacts) as Arc<dyn ArtifactStore>,
        config,
        Arc::clone(&trigger) as Arc<dyn DispatchTrigger>,
    );
    Harness {
        repo,
        artifacts,
        trigger,
        executor,
    }
}

async fn claimed_task(repo: &ConflictingRepository) -> AudioTask {
    let mut task = AudioTask::new("task", Some(AudioFile::new(&b"bytes"[..], "a.mp3")));
    task.enqueue().unwrap();
    repo.create(&task).await.unwrap();
    assert!(repo.claim_for_transcription(task.id).await.unwrap());
    repo.get_by_id(task.id).await.unwrap().unwrap()
}

#[tokio::test]
async fn given_successful_transcription_then_task_done_with_artifact_and_retrigger() {
    let h = harness(StubEngine::ok("  hello  "), 0, ProcessingMode::Immediate);
    let task = claimed_task(&h.repo).await;

    h.executor.run(task.clone()).await;

    let stored = h.repo.get_by_id(task.id).await.unwrap().unwrap();
    assert_eq!(stored.state, TaskState::Done);
    let transcript = stored.transcript.unwrap();
    assert_eq!(transcript.text, "hello");

    let artifact = h
        .artifacts
        .fetch(task.id, &format!("transcription_{}.txt", task.id))
        .await
        .unwrap();
    assert_eq!(artifact, b"hello");
    assert_eq!(h.trigger.cycles.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn given_empty_transcription_then_task_fails_mentioning_empty_result() {
    let h = harness(StubEngine::ok("   "), 0, ProcessingMode::Immediate);
    let task = claimed_task(&h.repo).await;

    h.executor.run(task.clone()).await;

    let stored = h.repo.get_by_id(task.id).await.unwrap().unwrap();
    assert_eq!(stored.state, TaskState::Error);
    assert!(stored.error_message.unwrap().contains("empty"));
    assert_eq!(h.trigger.cycles.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn given_provider_error_then_task_fails_with_message() {
    let h = harness(
        StubEngine::err("status 500: whisper down"),
        0,
        ProcessingMode::Immediate,
    );
    let task = claimed_task(&h.repo).await;

    h.executor.run(task.clone()).await;

    let stored = h.repo.get_by_id(task.id).await.unwrap().unwrap();
    assert_eq!(stored.state, TaskState::Error);
    assert!(stored.error_message.unwrap().contains("whisper down"));
}

#[tokio::test(start_paused = true)]
async fn given_provider_hang_then_task_fails_with_timeout_message() {
    let engine = StubEngine {
        response: Ok("late"),
        delay: Duration::from_secs(3600),
    };
    let h = harness(engine, 0, ProcessingMode::Immediate);
    let executor = h.executor.with_provider_timeout(Duration::from_secs(30));
    let task = claimed_task(&h.repo).await;

    executor.run(task.clone()).await;

    let stored = h.repo.get_by_id(task.id).await.unwrap().unwrap();
    assert_eq!(stored.state, TaskState::Error);
    assert!(stored.error_message.unwrap().contains("timed out"));
}

#[tokio::test(start_paused = true)]
async fn given_two_conflicts_then_save_succeeds_on_third_attempt_with_growing_backoff() {
    let h = harness(StubEngine::ok("hello"), 2, ProcessingMode::Immediate);
    let task = claimed_task(&h.repo).await;

    h.executor.run(task.clone()).await;

    let stored = h.repo.get_by_id(task.id).await.unwrap().unwrap();
    assert_eq!(stored.state, TaskState::Done);

    let attempts = h.repo.attempt_times();
    assert_eq!(attempts.len(), 3);
    // Linear backoff: 500 ms after the first conflict, 1000 ms after the
    // second. Exact under the paused clock.
    assert_eq!(attempts[1] - attempts[0], Duration::from_millis(500));
    assert_eq!(attempts[2] - attempts[1], Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn given_conflicts_on_all_attempts_then_task_is_left_transcribing() {
    let h = harness(StubEngine::ok("hello"), 3, ProcessingMode::Immediate);
    let task = claimed_task(&h.repo).await;

    h.executor.run(task.clone()).await;

    assert_eq!(h.repo.attempt_times().len(), 3);
    // Degraded state: the success save exhausted its retries and nothing
    // reclaims the slot automatically.
    let stored = h.repo.get_by_id(task.id).await.unwrap().unwrap();
    assert_eq!(stored.state, TaskState::Transcribing);
    // The loop still closes: self-retrigger fires regardless.
    assert_eq!(h.trigger.cycles.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn given_task_deleted_mid_flight_then_save_is_a_silent_noop() {
    let h = harness(StubEngine::ok("hello"), 0, ProcessingMode::Immediate);
    let task = claimed_task(&h.repo).await;
    h.repo.delete(task.id).await.unwrap();

    h.executor.run(task.clone()).await;

    assert!(h.repo.get_by_id(task.id).await.unwrap().is_none());
    assert_eq!(h.trigger.cycles.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn given_scheduled_mode_then_no_self_retrigger_after_completion() {
    let h = harness(StubEngine::ok("hello"), 0, ProcessingMode::Scheduled);
    let task = claimed_task(&h.repo).await;

    h.executor.run(task.clone()).await;

    let stored = h.repo.get_by_id(task.id).await.unwrap().unwrap();
    assert_eq!(stored.state, TaskState::Done);
    assert_eq!(h.trigger.cycles.load(Ordering::SeqCst), 0);
}
