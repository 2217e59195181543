//! Peer discovery: which channels a peer has joined, and their heights.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DiscoveryError;

/// Ledger summary of one channel, as reported by the peer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChainInfo {
    /// Number of blocks on the channel; the newest block is `height - 1`.
    pub height: u64,
    #[serde(with = "crate::hex_bytes")]
    pub current_hash: Vec<u8>,
    #[serde(with = "crate::hex_bytes")]
    pub previous_hash: Vec<u8>,
}

#[async_trait]
pub trait PeerDiscovery: Send + Sync {
    /// Names of the channels the peer participates in.
    async fn list_channels(&self) -> Result<Vec<String>, DiscoveryError>;

    async fn chain_info(&self, channel: &str) -> Result<ChainInfo, DiscoveryError>;
}
