use async_trait::async_trait;

#[async_trait]
pub trait TranscriptionEngine: Send + Sync {
    /// Submit audio bytes for transcription. The filename drives MIME
    /// inference; the language hint is optional.
    async fn transcribe(
        &self,
        audio_data: &[u8],
        filename: &str,
        language: Option<&str>,
    ) -> Result<String, TranscriptionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("audio file is empty")]
    EmptyAudio,
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),
}
