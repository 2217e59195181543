//! `BlockParser` — raw block to `BlockView`.

use chainwatch_core::error::ParseError;
use chainwatch_core::model::{BlockHeaderView, BlockMetadataView, BlockView, ValidationCode};
use chainwatch_core::proto::{Block, BlockMetadataIndex};
use prost::Message;

use crate::envelope::parse_envelope;
use crate::signatures;

/// Stateless block parser. Thread-safe and cheap to clone.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlockParser;

impl BlockParser {
    pub fn new() -> Self {
        Self
    }

    /// Decode a marshalled block and parse it.
    pub fn parse_bytes(
        &self,
        bytes: &[u8],
        config_block: Option<&Block>,
    ) -> Result<BlockView, ParseError> {
        let block = Block::decode(bytes).map_err(ParseError::decode("block"))?;
        self.parse(&block, config_block)
    }

    /// Parse a block.
    ///
    /// `config_block` is the latest configuration block of the channel. When
    /// given and the channel runs a BFT orderer, the signatures of every
    /// consenter are extracted in addition to the primary orderer signer.
    pub fn parse(&self, block: &Block, config_block: Option<&Block>) -> Result<BlockView, ParseError> {
        let header = block
            .header
            .as_ref()
            .ok_or(ParseError::MissingField { field: "block.header" })?;

        let raw_envelopes = block.envelopes();
        let flags = BlockMetadataIndex::TransactionsFilter.get(block.metadata.as_ref());
        if let Some(flags) = flags {
            if flags.len() < raw_envelopes.len() {
                return Err(ParseError::FlagsMismatch {
                    flags: flags.len(),
                    envelopes: raw_envelopes.len(),
                });
            }
        }

        let envelopes = raw_envelopes
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                let code = flags
                    .map(|f| ValidationCode(f[index]))
                    .unwrap_or(ValidationCode::VALID);
                parse_envelope(index, raw, code)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(BlockView {
            header: BlockHeaderView::from(header),
            envelopes,
            metadata: BlockMetadataView {
                orderer_signatures: signatures::orderer_signatures(block, config_block)?,
                last_config_index: signatures::last_config_index(block),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainwatch_core::fixtures::{raw_envelope, BlockBuilder};
    use chainwatch_core::model::{EnvelopePayload, HeaderType};

    #[test]
    fn missing_header_is_malformed() {
        let err = BlockParser::new().parse(&Block::default(), None).unwrap_err();
        assert!(matches!(err, ParseError::MissingField { field: "block.header" }));
    }

    #[test]
    fn empty_block_parses() {
        let block = BlockBuilder::new(0).build();
        let view = BlockParser::new().parse(&block, None).unwrap();
        assert_eq!(view.number(), 0);
        assert!(view.envelopes.is_empty());
        assert!(view.metadata.orderer_signatures.is_empty());
    }

    #[test]
    fn missing_flags_mean_valid() {
        let block = BlockBuilder::new(2)
            .envelope(raw_envelope("c", HeaderType::Message, b"hello"))
            .build();
        let view = BlockParser::new().parse(&block, None).unwrap();
        assert!(view.envelopes[0].is_valid());
        assert_eq!(
            view.envelopes[0].payload,
            EnvelopePayload::Raw {
                raw_unparsed: b"hello".to_vec()
            }
        );
    }

    #[test]
    fn short_flags_are_rejected() {
        let block = BlockBuilder::new(2)
            .envelope(raw_envelope("c", HeaderType::Message, b"a"))
            .envelope(raw_envelope("c", HeaderType::Message, b"b"))
            .flags(&[0])
            .build();
        let err = BlockParser::new().parse(&block, None).unwrap_err();
        assert!(matches!(
            err,
            ParseError::FlagsMismatch {
                flags: 1,
                envelopes: 2
            }
        ));
    }

    #[test]
    fn garbage_bytes_fail() {
        assert!(BlockParser::new().parse_bytes(&[0xff, 0xff, 0xff], None).is_err());
    }
}
