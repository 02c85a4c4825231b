use chrono::{DateTime, Utc};

use super::{AudioFile, TaskId, TaskState, Transcript, SUPPORTED_EXTENSIONS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Priority {
    Normal,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Normal => "NORMAL",
            Priority::High => "HIGH",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NORMAL" => Ok(Priority::Normal),
            "HIGH" => Ok(Priority::High),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}

/// Unit of work: one audio file tracked from upload to transcription outcome.
///
/// State mutations go through the transition methods below; they are the only
/// path that keeps the result/error fields consistent with the state.
#[derive(Debug, Clone)]
pub struct AudioTask {
    pub id: TaskId,
    pub name: String,
    pub state: TaskState,
    pub audio: Option<AudioFile>,
    pub transcript: Option<Transcript>,
    pub error_message: Option<String>,
    // Descriptive only. The dispatcher never consults priority: selection is
    // FIFO by created_at.
    pub priority: Priority,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub owner: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AudioTask {
    pub fn new(name: impl Into<String>, audio: Option<AudioFile>) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::new(),
            name: name.into(),
            state: TaskState::Draft,
            audio,
            transcript: None,
            error_message: None,
            priority: Priority::Normal,
            category: None,
            tags: Vec::new(),
            owner: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Validate the payload and move the task into the queue.
    ///
    /// Accepted from Draft and from Error (manual resubmission). A rejected
    /// enqueue leaves the task untouched.
    pub fn enqueue(&mut self) -> Result<(), TaskError> {
        if !matches!(self.state, TaskState::Draft | TaskState::Error) {
            return Err(TaskError::NotEnqueueable { state: self.state });
        }
        self.validate_audio()?;
        self.state = TaskState::Pending;
        self.error_message = None;
        self.touch();
        Ok(())
    }

    /// Remove a queued task from the queue. No-op outside Pending.
    pub fn cancel(&mut self) -> bool {
        if self.state != TaskState::Pending {
            return false;
        }
        self.state = TaskState::Draft;
        self.touch();
        true
    }

    /// Return to Draft, clearing any previous outcome. Idempotent.
    pub fn reset(&mut self) {
        self.state = TaskState::Draft;
        self.transcript = None;
        self.error_message = None;
        self.touch();
    }

    /// Claim the task for execution. Returns false unless it was Pending.
    pub fn start_transcribing(&mut self) -> bool {
        if self.state != TaskState::Pending {
            return false;
        }
        self.state = TaskState::Transcribing;
        self.touch();
        true
    }

    pub fn complete(&mut self, transcript: Transcript) {
        self.state = TaskState::Done;
        self.transcript = Some(transcript);
        self.error_message = None;
        self.touch();
    }

    pub fn fail(&mut self, error_message: impl Into<String>) {
        self.state = TaskState::Error;
        self.transcript = None;
        self.error_message = Some(error_message.into());
        self.touch();
    }

    pub fn validate_audio(&self) -> Result<(), TaskError> {
        let audio = self.audio.as_ref().ok_or(TaskError::MissingAudio)?;
        if audio.is_empty() {
            return Err(TaskError::MissingAudio);
        }
        if audio.filename.is_empty() {
            return Err(TaskError::MissingFilename);
        }
        if !audio.has_supported_extension() {
            return Err(TaskError::UnsupportedFormat {
                filename: audio.filename.clone(),
            });
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("please upload an audio file first")]
    MissingAudio,
    #[error("audio filename is missing")]
    MissingFilename,
    #[error("invalid audio format for '{filename}', supported: {}", SUPPORTED_EXTENSIONS.join(", "))]
    UnsupportedFormat { filename: String },
    #[error("task in state {state} cannot be enqueued")]
    NotEnqueueable { state: TaskState },
}
