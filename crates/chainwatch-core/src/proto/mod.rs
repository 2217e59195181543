//! Protobuf messages of the platform wire format.
//!
//! Message shapes and field tags mirror the platform's `.proto` definitions
//! so blocks decode bit-for-bit compatibly. Only the messages the observation
//! pipeline touches are declared; unknown fields are skipped by `prost`.

pub mod common;
pub mod configtx;
pub mod msp;
pub mod orderer;
pub mod peer;
pub mod rwset;

pub use common::{
    Block, BlockData, BlockHeader, BlockMetadata, ChannelHeader, Envelope, Header, Payload,
    SignatureHeader,
};

/// Positions inside `BlockMetadata.metadata`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum BlockMetadataIndex {
    Signatures = 0,
    LastConfig = 1,
    TransactionsFilter = 2,
    Orderer = 3,
    CommitHash = 4,
}

impl BlockMetadataIndex {
    /// Returns the metadata bytes stored at this index, if present and non-empty.
    pub fn get(self, metadata: Option<&BlockMetadata>) -> Option<&[u8]> {
        metadata
            .and_then(|m| m.metadata.get(self as usize))
            .map(Vec::as_slice)
            .filter(|b| !b.is_empty())
    }
}
