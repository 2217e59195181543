//! # chainwatch-observability
//!
//! OpenTelemetry-based observability for ChainWatch.
//!
//! ## Built-in metrics
//! - `chainwatch.blocks_emitted`    — counter, tagged with channel
//! - `chainwatch.parse_errors`      — counter, tagged with channel
//! - `chainwatch.transform_errors`  — counter, tagged with channel + transformer
//! - `chainwatch.reconnections`     — counter, tagged with channel
//! - `chainwatch.channels_spawned`  — counter
//! - `chainwatch.parse_latency_ms`  — histogram, tagged with channel
//!
//! [`ChainWatchMetrics`] implements `StreamHooks`, so it plugs straight into
//! a channel or peer stream.
//!
//! ## Structured logging
//! Text or JSON logs through `tracing-subscriber`, with per-component levels.

pub mod metrics;
pub mod tracing_setup;

pub use metrics::ChainWatchMetrics;
pub use tracing_setup::{init_tracing, LogConfig};
