mod local_artifact_store;
mod memory_artifact_store;

pub use local_artifact_store::LocalArtifactStore;
pub use memory_artifact_store::InMemoryArtifactStore;
