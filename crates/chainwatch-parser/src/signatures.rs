//! Orderer signatures and the last-config pointer from block metadata.

use chainwatch_core::error::ParseError;
use chainwatch_core::model::{is_bft_type, Identity, OrdererSignature};
use chainwatch_core::proto::common::{
    IdentifierHeader, LastConfig, Metadata, OrdererBlockMetadata,
};
use chainwatch_core::proto::configtx::ConfigEnvelope;
use chainwatch_core::proto::orderer::{BftConfigMetadata, ConsensusType};
use chainwatch_core::proto::{
    Block, BlockMetadataIndex, ChannelHeader, Envelope, Payload, SignatureHeader,
};
use chainwatch_core::HeaderType;
use prost::Message;
use tracing::debug;

use crate::config::ORDERER_GROUP;
use crate::envelope::decode_identity;

/// A BFT consenter as needed for signature attribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consenter {
    pub id: u64,
    pub identity: Identity,
}

/// Orderer signatures over `block`.
///
/// The primary signer is taken from the first signature of the SIGNATURES
/// metadata, with an empty signature value. When `config_block` is given and
/// its orderer runs BFT consensus, each signature carrying an identifier
/// header whose id names a known consenter adds `{consenter, signature}`.
pub fn orderer_signatures(
    block: &Block,
    config_block: Option<&Block>,
) -> Result<Vec<OrdererSignature>, ParseError> {
    let consenters = match config_block {
        Some(cfg) => bft_consenters(cfg)?,
        None => None,
    };

    let Some(raw) = BlockMetadataIndex::Signatures.get(block.metadata.as_ref()) else {
        return Ok(Vec::new());
    };
    let metadata = Metadata::decode(raw).map_err(ParseError::decode("signatures metadata"))?;

    let mut out = Vec::new();
    if let Some(first) = metadata.signatures.first() {
        let header = SignatureHeader::decode(first.signature_header.as_slice())
            .map_err(ParseError::decode("orderer signature header"))?;
        if !header.creator.is_empty() {
            let identity = decode_identity(&header.creator)
                .map_err(ParseError::decode("orderer identity"))?;
            out.push(OrdererSignature {
                identity,
                signature: Vec::new(),
            });
        }
    }

    if let Some(consenters) = consenters {
        for sig in &metadata.signatures {
            if sig.identifier_header.is_empty() {
                continue;
            }
            let id = match IdentifierHeader::decode(sig.identifier_header.as_slice()) {
                Ok(h) => u64::from(h.identifier),
                Err(e) => {
                    debug!(error = %e, "skipping undecodable identifier header");
                    continue;
                }
            };
            match consenters.iter().find(|c| c.id == id) {
                Some(c) => out.push(OrdererSignature {
                    identity: c.identity.clone(),
                    signature: sig.signature.clone(),
                }),
                None => debug!(consenter = id, "signature from unknown consenter"),
            }
        }
    }

    Ok(out)
}

/// Consenters of a BFT orderer read from a config block. `Ok(None)` when the
/// orderer uses another consensus type.
pub fn bft_consenters(config_block: &Block) -> Result<Option<Vec<Consenter>>, ParseError> {
    let invalid = |reason: &str| ParseError::ConfigBlock {
        reason: reason.to_string(),
    };

    let config = config_block
        .envelopes()
        .iter()
        .find_map(|raw| config_envelope(raw))
        .ok_or_else(|| invalid("no CONFIG envelope"))?;

    let consensus = config
        .config
        .and_then(|c| c.channel_group)
        .and_then(|mut root| root.groups.remove(ORDERER_GROUP))
        .and_then(|orderer| orderer.values.get("ConsensusType").cloned())
        .ok_or_else(|| invalid("no orderer ConsensusType"))?;
    let consensus = ConsensusType::decode(consensus.value.as_slice())
        .map_err(|e| invalid(&format!("consensus type: {e}")))?;

    if !is_bft_type(&consensus.r#type) {
        return Ok(None);
    }

    let metadata = BftConfigMetadata::decode(consensus.metadata.as_slice())
        .map_err(|e| invalid(&format!("BFT consensus metadata: {e}")))?;
    metadata
        .consenters
        .into_iter()
        .map(|c| {
            let identity = decode_identity(&c.identity).map_err(|e| {
                invalid(&format!("identity of consenter {}: {e}", c.consenter_id))
            })?;
            Ok(Consenter {
                id: c.consenter_id,
                identity,
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn config_envelope(raw: &[u8]) -> Option<ConfigEnvelope> {
    let env = Envelope::decode(raw).ok()?;
    let payload = Payload::decode(env.payload.as_slice()).ok()?;
    let header = ChannelHeader::decode(payload.header?.channel_header.as_slice()).ok()?;
    if HeaderType::from_i32(header.r#type) != HeaderType::Config {
        return None;
    }
    ConfigEnvelope::decode(payload.data.as_slice()).ok()
}

/// Index of the last configuration block. Read from the SIGNATURES slot on
/// current orderers, falling back to the legacy LAST_CONFIG slot.
pub fn last_config_index(block: &Block) -> Option<u64> {
    let md = block.metadata.as_ref();

    let from_signatures = BlockMetadataIndex::Signatures
        .get(md)
        .and_then(|raw| Metadata::decode(raw).ok())
        .and_then(|m| OrdererBlockMetadata::decode(m.value.as_slice()).ok())
        .and_then(|o| o.last_config)
        .map(|lc| lc.index);

    from_signatures.or_else(|| {
        let raw = BlockMetadataIndex::LastConfig.get(md)?;
        let m = Metadata::decode(raw).ok()?;
        LastConfig::decode(m.value.as_slice()).ok().map(|lc| lc.index)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainwatch_core::fixtures::{serialized_identity, BlockBuilder, ConfigFixture, ConsenterFixture};
    use chainwatch_core::proto::BlockMetadata;

    fn bft_config() -> Block {
        ConfigFixture::new("mychannel")
            .bft(vec![
                ConsenterFixture::new(1, "OrdererMSP"),
                ConsenterFixture::new(2, "OrdererMSP"),
                ConsenterFixture::new(3, "OrdererMSP"),
            ])
            .block(0)
    }

    #[test]
    fn primary_signer_without_config_block() {
        let block = BlockBuilder::new(5)
            .orderer_signature(serialized_identity("OrdererMSP", b"cert"), b"sig")
            .build();
        let sigs = orderer_signatures(&block, None).unwrap();
        assert_eq!(sigs.len(), 1);
        assert_eq!(sigs[0].identity.msp_id, "OrdererMSP");
        assert!(sigs[0].signature.is_empty());
    }

    #[test]
    fn absent_metadata_yields_nothing() {
        let block = BlockBuilder::new(5).build();
        assert!(orderer_signatures(&block, None).unwrap().is_empty());
    }

    #[test]
    fn bft_signatures_match_consenters() {
        let block = BlockBuilder::new(5)
            .bft_signature(1, b"s1")
            .bft_signature(3, b"s3")
            .bft_signature(9, b"unknown")
            .build();
        let sigs = orderer_signatures(&block, Some(&bft_config())).unwrap();
        assert_eq!(sigs.len(), 2);
        assert_eq!(sigs[0].signature, b"s1");
        assert_eq!(sigs[1].signature, b"s3");
        assert_eq!(sigs[1].identity.msp_id, "OrdererMSP");
    }

    #[test]
    fn non_bft_config_skips_secondary_layer() {
        let config = ConfigFixture::new("mychannel")
            .raft(&[("orderer", 7050)])
            .block(0);
        let block = BlockBuilder::new(5).bft_signature(1, b"s1").build();
        assert!(bft_consenters(&config).unwrap().is_none());
        assert!(orderer_signatures(&block, Some(&config)).unwrap().is_empty());
    }

    #[test]
    fn bad_consenter_identity_is_fatal() {
        let mut broken = ConsenterFixture::new(1, "OrdererMSP");
        broken.identity = vec![0x0a, 0x7f];
        let config = ConfigFixture::new("mychannel").bft(vec![broken]).block(0);
        let block = BlockBuilder::new(5).bft_signature(1, b"s1").build();
        assert!(matches!(
            orderer_signatures(&block, Some(&config)),
            Err(ParseError::ConfigBlock { .. })
        ));
    }

    #[test]
    fn garbage_identifier_header_is_skipped() {
        use chainwatch_core::proto::common::MetadataSignature;
        let md = Metadata {
            value: vec![],
            signatures: vec![MetadataSignature {
                signature_header: vec![],
                signature: b"s".to_vec(),
                identifier_header: vec![0xff],
            }],
        };
        let block = Block {
            header: None,
            data: None,
            metadata: Some(BlockMetadata {
                metadata: vec![md.encode_to_vec()],
            }),
        };
        assert!(orderer_signatures(&block, Some(&bft_config())).unwrap().is_empty());
    }

    #[test]
    fn last_config_from_signatures_slot() {
        let block = BlockBuilder::new(8).last_config(4).build();
        assert_eq!(last_config_index(&block), Some(4));
        assert_eq!(last_config_index(&BlockBuilder::new(8).build()), None);
    }

    #[test]
    fn last_config_legacy_slot() {
        let legacy = Metadata {
            value: LastConfig { index: 6 }.encode_to_vec(),
            signatures: vec![],
        };
        let block = Block {
            header: None,
            data: None,
            metadata: Some(BlockMetadata {
                metadata: vec![vec![], legacy.encode_to_vec()],
            }),
        };
        assert_eq!(last_config_index(&block), Some(6));
    }
}
