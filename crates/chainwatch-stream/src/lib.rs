//! # chainwatch-stream
//!
//! Tokio-based block observation for a permissioned ledger peer.
//!
//! ## Architecture
//!
//! ```text
//! PeerDiscovery ──► PeerChannelWatcher ──(channel snapshot)──► PeerStream
//!                                                                 │
//!                          one ChannelStream per matching channel ┤
//!                                                                 ▼
//! BlocksDeliverer ──► ChannelStream ──► BlockHandler ──► mpsc ──► merged / per-channel
//!                                                                 │
//!                                                                 ▼
//!                                                            FanoutHub ──► subscribers
//! ```
//!
//! Every component takes a parent `CancellationToken` in `observe` and
//! tracks its tasks with a `TaskTracker`; `closed()` waits for them.

pub mod channel_stream;
pub mod config;
pub mod handler;
pub mod hub;
pub mod matcher;
pub mod memory;
pub mod peer_stream;
pub mod retry;
pub mod seek;
pub mod watcher;

pub use channel_stream::{ChannelStream, ChannelStreamOptions, StreamState, StreamStatus};
pub use config::{ChannelRule, ObserverConfig, SeekFrom};
pub use handler::{BlockHandler, Handled, ParsedBlocks, RawBlocks};
pub use hub::{FanoutHub, LaneCloser};
pub use matcher::{ChannelMatcher, MatchedChannel};
pub use memory::{MemoryPeer, UnsignedIdentity};
pub use peer_stream::{ChannelSubscription, PeerStream, PeerStreamBuilder};
pub use retry::{RetryConfig, RetryPolicy};
pub use seek::{CallbackSeek, FixedSeek, NewestSeek, OldestSeek, SeekFromFetcher};
pub use watcher::PeerChannelWatcher;
