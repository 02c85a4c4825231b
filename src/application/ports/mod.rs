mod artifact_store;
mod dispatch_trigger;
mod repository_error;
mod task_repository;
mod transcription_engine;

pub use artifact_store::{ArtifactStore, ArtifactStoreError};
pub use dispatch_trigger::DispatchTrigger;
pub use repository_error::RepositoryError;
pub use task_repository::TaskRepository;
pub use transcription_engine::{TranscriptionEngine, TranscriptionError};
