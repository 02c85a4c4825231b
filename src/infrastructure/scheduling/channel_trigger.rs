use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::application::ports::DispatchTrigger;
use crate::application::services::Dispatcher;

/// `DispatchTrigger` backed by an mpsc channel whose receiver drives the
/// dispatch loop. A full channel means a cycle is already queued, so the
/// request is simply dropped.
pub struct ChannelDispatchTrigger {
    sender: mpsc::Sender<()>,
}

pub fn dispatch_channel(capacity: usize) -> (ChannelDispatchTrigger, mpsc::Receiver<()>) {
    let (sender, receiver) = mpsc::channel(capacity);
    (ChannelDispatchTrigger { sender }, receiver)
}

#[async_trait]
impl DispatchTrigger for ChannelDispatchTrigger {
    async fn request_cycle(&self) {
        let _ = self.sender.try_send(());
    }
}

/// Drive the dispatcher from the trigger channel plus a periodic tick. Runs
/// until the channel closes.
pub async fn run_dispatch_loop(
    dispatcher: Arc<Dispatcher>,
    mut receiver: mpsc::Receiver<()>,
    poll_interval: Duration,
) {
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    tracing::info!(poll_secs = poll_interval.as_secs(), "Dispatch loop started");
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            request = receiver.recv() => {
                if request.is_none() {
                    break;
                }
            }
        }

        if let Err(e) = dispatcher.run_cycle().await {
            tracing::error!(error = %e, "Dispatch cycle failed");
        }
    }
    tracing::info!("Dispatch loop stopped: trigger channel closed");
}
