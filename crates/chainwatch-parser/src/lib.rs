//! # chainwatch-parser
//!
//! Turns a raw `common.Block` into a [`BlockView`](chainwatch_core::BlockView):
//! envelopes with their validation codes, endorser transactions down to the
//! read-write sets, decoded channel configuration, and the orderer
//! signatures over the block.
//!
//! Parsing is pure and deterministic. The same parser can be shared between
//! tasks.

pub mod config;
mod envelope;
pub mod parser;
pub mod signatures;
mod transaction;

pub use config::parse_config_envelope;
pub use parser::BlockParser;
