mod audio_file;
mod task;
mod task_id;
mod task_state;
mod transcript;

pub use audio_file::{mime_type_for, AudioFile, SUPPORTED_EXTENSIONS};
pub use task::{AudioTask, Priority, TaskError};
pub use task_id::TaskId;
pub use task_state::TaskState;
pub use transcript::Transcript;
