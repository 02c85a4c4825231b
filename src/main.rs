use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use kobzar::application::config::ProcessingConfig;
use kobzar::application::ports::{ArtifactStore, DispatchTrigger, TaskRepository, TranscriptionEngine};
use kobzar::application::services::Dispatcher;
use kobzar::infrastructure::audio::OpenAiWhisperEngine;
use kobzar::infrastructure::observability::{init_tracing, TracingConfig};
use kobzar::infrastructure::persistence::{create_pool, InMemoryTaskRepository, PgTaskRepository};
use kobzar::infrastructure::scheduling::{dispatch_channel, run_dispatch_loop};
use kobzar::infrastructure::storage::LocalArtifactStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing(TracingConfig::default());

    let config = Arc::new(ProcessingConfig::from_env());
    if !config.has_api_key() {
        tracing::warn!("OPENAI_API_KEY not set; queued tasks will fail at dispatch");
    }

    let repository: Arc<dyn TaskRepository> = match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let pool = create_pool(&url, 5).await?;
            Arc::new(PgTaskRepository::new(pool))
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; using in-memory task store");
            Arc::new(InMemoryTaskRepository::new())
        }
    };

    let mut whisper = OpenAiWhisperEngine::new(
        config.openai_api_key.clone().unwrap_or_default(),
        std::env::var("WHISPER_BASE_URL").ok(),
        std::env::var("WHISPER_MODEL").ok(),
    );
    if let Some(secs) = std::env::var("WHISPER_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
    {
        whisper = whisper.with_timeout(Duration::from_secs(secs));
    }
    let engine: Arc<dyn TranscriptionEngine> = Arc::new(whisper);

    let artifact_dir = std::env::var("ARTIFACT_DIR").unwrap_or_else(|_| "artifacts".to_string());
    let artifacts: Arc<dyn ArtifactStore> =
        Arc::new(LocalArtifactStore::new(PathBuf::from(artifact_dir))?);

    let (trigger, receiver) = dispatch_channel(8);
    let trigger: Arc<dyn DispatchTrigger> = Arc::new(trigger);

    let dispatcher = Arc::new(Dispatcher::new(
        repository,
        engine,
        artifacts,
        Arc::clone(&config),
        trigger,
    ));

    let poll_secs: u64 = std::env::var("DISPATCH_POLL_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(60);

    run_dispatch_loop(dispatcher, receiver, Duration::from_secs(poll_secs)).await;

    Ok(())
}
