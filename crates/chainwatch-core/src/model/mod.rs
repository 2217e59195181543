//! Parsed block model — the primary output of ChainWatch.
//!
//! A [`BlockView`] is a derived, serializable view over one raw
//! [`proto::Block`](crate::proto::Block). Envelopes keep the order and count
//! of the raw block; each carries its validation code and a payload variant
//! chosen by the channel header type.

mod config;
mod envelope;
mod transaction;

pub use config::*;
pub use envelope::*;
pub use transaction::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::proto;

/// A fully parsed block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockView {
    pub header: BlockHeaderView,
    /// Same length and order as the raw block's envelopes.
    pub envelopes: Vec<EnvelopeView>,
    pub metadata: BlockMetadataView,
}

impl BlockView {
    pub fn number(&self) -> u64 {
        self.header.number
    }

    /// Envelopes admitted to the ledger state (`validation_code == VALID`).
    pub fn valid_envelopes(&self) -> impl Iterator<Item = &EnvelopeView> {
        self.envelopes.iter().filter(|e| e.validation_code.is_valid())
    }

    /// The channel configuration carried by this block, if it is a config block.
    pub fn channel_config(&self) -> Option<&ChannelConfigView> {
        self.envelopes.iter().find_map(EnvelopeView::config)
    }

    /// Mutable access to every endorser transaction, in block order.
    pub fn transactions_mut(&mut self) -> impl Iterator<Item = &mut TransactionView> {
        self.envelopes.iter_mut().filter_map(EnvelopeView::transaction_mut)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeaderView {
    pub number: u64,
    #[serde(with = "crate::hex_bytes")]
    pub previous_hash: Vec<u8>,
    #[serde(with = "crate::hex_bytes")]
    pub data_hash: Vec<u8>,
}

impl From<&proto::BlockHeader> for BlockHeaderView {
    fn from(h: &proto::BlockHeader) -> Self {
        Self {
            number: h.number,
            previous_hash: h.previous_hash.clone(),
            data_hash: h.data_hash.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockMetadataView {
    pub orderer_signatures: Vec<OrdererSignature>,
    /// Index of the last configuration block, when the orderer recorded it.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub last_config_index: Option<u64>,
}

/// An orderer's signature over the block. `signature` is empty when the
/// signer was taken from the primary (non-BFT) metadata path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdererSignature {
    pub identity: Identity,
    #[serde(with = "crate::hex_bytes")]
    pub signature: Vec<u8>,
}

/// A block tagged with the channel it was delivered on.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelBlock<T> {
    pub channel: String,
    pub block: T,
}

impl<T> ChannelBlock<T> {
    pub fn new(channel: impl Into<String>, block: T) -> Self {
        Self {
            channel: channel.into(),
            block,
        }
    }
}

impl<T: BlockNumber> ChannelBlock<T> {
    pub fn number(&self) -> Option<u64> {
        self.block.block_number()
    }
}

/// Anything that knows its block number.
pub trait BlockNumber {
    fn block_number(&self) -> Option<u64>;
}

impl BlockNumber for proto::Block {
    fn block_number(&self) -> Option<u64> {
        self.number()
    }
}

impl BlockNumber for BlockView {
    fn block_number(&self) -> Option<u64> {
        Some(self.header.number)
    }
}

impl<T: BlockNumber> BlockNumber for std::sync::Arc<T> {
    fn block_number(&self) -> Option<u64> {
        (**self).block_number()
    }
}

/// Cached channel status published by the peer channel watcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub channel_name: String,
    pub height: u64,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(code: u8) -> EnvelopeView {
        EnvelopeView {
            channel_header: ChannelHeaderView {
                header_type: HeaderType::Message,
                version: 0,
                channel_id: "sample-channel".into(),
                tx_id: "tx".into(),
                timestamp: None,
                epoch: 0,
            },
            signature_header: SignatureHeaderView::default(),
            signature: vec![],
            validation_code: ValidationCode(code),
            payload: EnvelopePayload::Raw {
                raw_unparsed: vec![1, 2, 3],
            },
        }
    }

    #[test]
    fn valid_projection_filters_by_code() {
        let view = BlockView {
            header: BlockHeaderView {
                number: 7,
                previous_hash: vec![],
                data_hash: vec![],
            },
            envelopes: vec![envelope(0), envelope(11), envelope(0)],
            metadata: BlockMetadataView::default(),
        };
        assert_eq!(view.envelopes.len(), 3);
        assert_eq!(view.valid_envelopes().count(), 2);
        assert_eq!(ChannelBlock::new("c", view).number(), Some(7));
    }

    #[test]
    fn block_view_serializes_bytes_as_hex() {
        let view = BlockView {
            header: BlockHeaderView {
                number: 1,
                previous_hash: vec![0xab, 0xcd],
                data_hash: vec![],
            },
            envelopes: vec![envelope(0)],
            metadata: BlockMetadataView::default(),
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["header"]["previous_hash"], "abcd");
        assert_eq!(json["envelopes"][0]["payload"]["kind"], "raw");
        assert_eq!(json["envelopes"][0]["payload"]["raw_unparsed"], "010203");

        let back: BlockView = serde_json::from_value(json).unwrap();
        assert_eq!(back, view);
    }
}
