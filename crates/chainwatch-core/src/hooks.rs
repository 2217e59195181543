//! Callbacks the streaming engine invokes at observable points.
//!
//! Metrics backends implement [`StreamHooks`]; every method has an empty
//! default body so implementations pick only what they record.

use std::time::Duration;

pub trait StreamHooks: Send + Sync {
    /// A block was delivered downstream.
    fn on_block_emitted(&self, _channel: &str, _block: u64) {}

    /// A block was parsed successfully in `elapsed`.
    fn on_block_parsed(&self, _channel: &str, _elapsed: Duration) {}

    /// A block failed to parse and was dropped.
    fn on_parse_error(&self, _channel: &str) {}

    /// A transformer reported an error or panicked.
    fn on_transform_error(&self, _channel: &str, _transformer: &str) {}

    /// A channel stream is reconnecting (`attempt` starts at 1).
    fn on_reconnect(&self, _channel: &str, _attempt: u64) {}

    /// A channel stream was spawned for a newly discovered channel.
    fn on_channel_spawned(&self, _channel: &str) {}
}

/// Hooks that record nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl StreamHooks for NoopHooks {}
