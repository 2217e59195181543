//! ChainWatch metrics definitions.
//!
//! All metrics use OpenTelemetry conventions and can be exported through
//! whatever meter provider the application installs.

use chainwatch_core::hooks::StreamHooks;
use opentelemetry::{
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};
use std::time::Duration;

/// Central metrics handle for ChainWatch.
#[derive(Clone)]
pub struct ChainWatchMetrics {
    pub blocks_emitted: Counter<u64>,
    pub parse_errors: Counter<u64>,
    pub transform_errors: Counter<u64>,
    pub reconnections: Counter<u64>,
    pub channels_spawned: Counter<u64>,
    pub parse_latency_ms: Histogram<f64>,
}

impl ChainWatchMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            blocks_emitted: meter
                .u64_counter("chainwatch.blocks_emitted")
                .with_description("Blocks delivered to downstream consumers")
                .build(),
            parse_errors: meter
                .u64_counter("chainwatch.parse_errors")
                .with_description("Blocks dropped because they failed to parse")
                .build(),
            transform_errors: meter
                .u64_counter("chainwatch.transform_errors")
                .with_description("Transformer failures, including panics")
                .build(),
            reconnections: meter
                .u64_counter("chainwatch.reconnections")
                .with_description("Channel stream reconnect attempts")
                .build(),
            channels_spawned: meter
                .u64_counter("chainwatch.channels_spawned")
                .with_description("Channel streams started for discovered channels")
                .build(),
            parse_latency_ms: meter
                .f64_histogram("chainwatch.parse_latency_ms")
                .with_description("Time to parse and transform one block in milliseconds")
                .build(),
        }
    }
}

fn channel_tag(channel: &str) -> [KeyValue; 1] {
    [KeyValue::new("channel", channel.to_string())]
}

impl StreamHooks for ChainWatchMetrics {
    fn on_block_emitted(&self, channel: &str, _block: u64) {
        self.blocks_emitted.add(1, &channel_tag(channel));
    }

    fn on_block_parsed(&self, channel: &str, elapsed: Duration) {
        self.parse_latency_ms
            .record(elapsed.as_secs_f64() * 1000.0, &channel_tag(channel));
    }

    fn on_parse_error(&self, channel: &str) {
        self.parse_errors.add(1, &channel_tag(channel));
    }

    fn on_transform_error(&self, channel: &str, transformer: &str) {
        self.transform_errors.add(
            1,
            &[
                KeyValue::new("channel", channel.to_string()),
                KeyValue::new("transformer", transformer.to_string()),
            ],
        );
    }

    fn on_reconnect(&self, channel: &str, _attempt: u64) {
        self.reconnections.add(1, &channel_tag(channel));
    }

    fn on_channel_spawned(&self, channel: &str) {
        self.channels_spawned.add(1, &channel_tag(channel));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn records_through_the_hook_interface() {
        // No provider installed: the global meter is a no-op.
        let meter = opentelemetry::global::meter("chainwatch-test");
        let hooks: Arc<dyn StreamHooks> = Arc::new(ChainWatchMetrics::new(&meter));
        hooks.on_channel_spawned("mychannel");
        hooks.on_block_parsed("mychannel", Duration::from_micros(1500));
        hooks.on_block_emitted("mychannel", 7);
        hooks.on_parse_error("mychannel");
        hooks.on_transform_error("mychannel", "redact");
        hooks.on_reconnect("mychannel", 1);
    }
}
