use async_trait::async_trait;

/// "Run a dispatch cycle now" capability of the external scheduler.
///
/// Used by enqueue (under Immediate mode) and by the executor's
/// self-retrigger. Requests may coalesce; duplicates are harmless since
/// `run_cycle` is no-op-safe.
#[async_trait]
pub trait DispatchTrigger: Send + Sync {
    async fn request_cycle(&self);
}
