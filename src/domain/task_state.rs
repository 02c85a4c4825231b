use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    Draft,
    Pending,
    Transcribing,
    Done,
    Error,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Draft => "DRAFT",
            TaskState::Pending => "PENDING",
            TaskState::Transcribing => "TRANSCRIBING",
            TaskState::Done => "DONE",
            TaskState::Error => "ERROR",
        }
    }
}

impl FromStr for TaskState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(TaskState::Draft),
            "PENDING" => Ok(TaskState::Pending),
            "TRANSCRIBING" => Ok(TaskState::Transcribing),
            "DONE" => Ok(TaskState::Done),
            "ERROR" => Ok(TaskState::Error),
            _ => Err(format!("Invalid task state: {}", s)),
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
