//! # chainwatch-core
//!
//! Core types, wire messages, and peer capabilities shared across all
//! ChainWatch crates. The block parser, the transformer pipeline, and the
//! streaming engine are all built on top of the interfaces defined here.
//!
//! ## Layout
//! - [`proto`] — protobuf messages of the platform wire format (blocks,
//!   envelopes, transactions, read-write sets, channel configuration).
//! - [`model`] — the parsed, serializable view over a block.
//! - [`deliver`], [`discovery`], [`identity`] — external capabilities the
//!   streaming engine consumes.
//! - [`seek`] — construction of the signed seek request sent to the deliver
//!   service.
//! - [`composite_key`] — NUL-delimited ledger key encoding.
//! - [`hooks`] — callbacks invoked by the streaming engine (metrics).

pub mod composite_key;
pub mod deliver;
pub mod discovery;
pub mod error;
pub mod hooks;
pub mod identity;
pub mod model;
pub mod proto;
pub mod seek;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

mod hex_bytes;

pub use deliver::{BlockStream, BlocksDeliverer, Delivery};
pub use discovery::{ChainInfo, PeerDiscovery};
pub use error::{
    DeliverError, DiscoveryError, IdentityError, MatcherError, ObserverError, ParseError,
    SeekError, StreamError, TransformError,
};
pub use hooks::{NoopHooks, StreamHooks};
pub use identity::SigningIdentity;
pub use model::{BlockView, ChannelBlock, ChannelInfo, EnvelopeView, HeaderType, ValidationCode};
pub use seek::SeekRequest;
