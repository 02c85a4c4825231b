mod dispatcher;
mod job_executor;
mod queue_service;
mod window_policy;

pub use dispatcher::{CycleOutcome, Dispatcher};
pub use job_executor::{ExecutorError, JobExecutor, DEFAULT_PROVIDER_TIMEOUT};
pub use queue_service::{QueueError, QueueService};
pub use window_policy::{hour_in_window, is_dispatch_allowed};
