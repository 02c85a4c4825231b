use std::time::Duration;

use super::TaskId;

/// Successful transcription outcome, written exactly once per completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub text: String,
    pub result_filename: String,
    pub elapsed: Duration,
}

impl Transcript {
    pub fn new(text: String, task_id: TaskId, elapsed: Duration) -> Self {
        Self {
            text,
            result_filename: format!("transcription_{}.txt", task_id),
            elapsed,
        }
    }
}
