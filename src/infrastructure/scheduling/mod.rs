mod channel_trigger;

pub use channel_trigger::{dispatch_channel, run_dispatch_loop, ChannelDispatchTrigger};
