//! What a channel stream emits for each delivered block.

use chainwatch_core::error::{ParseError, TransformError};
use chainwatch_core::model::{BlockView, ChannelBlock};
use chainwatch_core::proto::Block;
use chainwatch_parser::signatures::bft_consenters;
use chainwatch_parser::BlockParser;
use chainwatch_transform::TransformerChain;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info};

/// The result of handling one block.
#[derive(Debug)]
pub struct Handled<T> {
    pub item: T,
    /// Transformer failures; the item is emitted regardless.
    pub transform_errors: Vec<TransformError>,
}

impl<T> Handled<T> {
    pub fn new(item: T) -> Self {
        Self {
            item,
            transform_errors: Vec::new(),
        }
    }
}

/// Turns a delivered block into the stream's element type. A parse error
/// drops the block.
pub trait BlockHandler: Send + Sync + 'static {
    type Output: Send + 'static;

    /// Whether `handle` parses; only then is parse latency reported.
    const PARSES: bool = false;

    fn handle(&self, channel: &str, block: Block) -> Result<Handled<Self::Output>, ParseError>;
}

/// Emits raw blocks untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawBlocks;

impl BlockHandler for RawBlocks {
    type Output = ChannelBlock<Block>;

    fn handle(&self, channel: &str, block: Block) -> Result<Handled<Self::Output>, ParseError> {
        Ok(Handled::new(ChannelBlock::new(channel, block)))
    }
}

/// Parses blocks and runs a transformer chain over them.
///
/// BFT orderer signatures need the channel's config block. One can be
/// supplied up front with [`with_config_block`](Self::with_config_block);
/// config blocks seen on the stream replace it.
#[derive(Debug, Default)]
pub struct ParsedBlocks {
    parser: BlockParser,
    transformers: TransformerChain,
    config_blocks: RwLock<HashMap<String, Block>>,
}

impl ParsedBlocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transformers(mut self, transformers: TransformerChain) -> Self {
        self.transformers = transformers;
        self
    }

    pub fn with_config_block(self, channel: impl Into<String>, block: Block) -> Self {
        self.set_config_block(channel, block);
        self
    }

    pub fn set_config_block(&self, channel: impl Into<String>, block: Block) {
        self.config_blocks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(channel.into(), block);
    }

    pub fn config_block(&self, channel: &str) -> Option<Block> {
        self.config_blocks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(channel)
            .cloned()
    }

    pub fn transformers(&self) -> &TransformerChain {
        &self.transformers
    }
}

impl BlockHandler for ParsedBlocks {
    type Output = ChannelBlock<BlockView>;

    const PARSES: bool = true;

    fn handle(&self, channel: &str, block: Block) -> Result<Handled<Self::Output>, ParseError> {
        let mut view = {
            let configs = self.config_blocks.read().unwrap_or_else(PoisonError::into_inner);
            self.parser.parse(&block, configs.get(channel))?
        };

        if view.channel_config().is_some() {
            match bft_consenters(&block) {
                Ok(_) => {
                    info!(channel, block = view.number(), "tracking channel config block");
                    self.set_config_block(channel, block);
                }
                Err(e) => debug!(channel, error = %e, "config block not usable for signatures"),
            }
        }

        let transform_errors = self.transformers.apply(&mut view);
        Ok(Handled {
            item: ChannelBlock::new(channel, view),
            transform_errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainwatch_core::fixtures::{endorser_block, BlockBuilder, ConfigFixture, ConsenterFixture};
    use chainwatch_transform::Transformer;

    struct Broken;

    impl Transformer for Broken {
        fn name(&self) -> &str {
            "broken"
        }
        fn transform(&self, _: &mut BlockView) -> Result<(), TransformError> {
            Err(TransformError::failed("broken", "always"))
        }
    }

    #[test]
    fn raw_passes_through() {
        let block = endorser_block("c", 3, 1);
        let out = RawBlocks.handle("c", block.clone()).unwrap();
        assert_eq!(out.item.block, block);
        assert_eq!(out.item.channel, "c");
    }

    #[test]
    fn parsed_reports_transform_errors_but_emits() {
        let handler = ParsedBlocks::new().with_transformers(TransformerChain::new().with(Broken));
        let out = handler.handle("c", endorser_block("c", 3, 2)).unwrap();
        assert_eq!(out.item.number(), Some(3));
        assert_eq!(out.transform_errors.len(), 1);
    }

    #[test]
    fn parse_failure_is_an_error() {
        let block = BlockBuilder::new(1).envelope(vec![0x0a, 0x05, 0x01]).build();
        assert!(ParsedBlocks::new().handle("c", block).is_err());
    }

    #[test]
    fn config_blocks_enable_bft_signatures() {
        let handler = ParsedBlocks::new();
        let config = ConfigFixture::new("c")
            .bft(vec![ConsenterFixture::new(1, "Orderer1MSP")])
            .block(0);
        handler.handle("c", config.clone()).unwrap();
        assert_eq!(handler.config_block("c"), Some(config));

        let block = BlockBuilder::new(1).bft_signature(1, b"sig").build();
        let out = handler.handle("c", block).unwrap();
        assert_eq!(out.item.block.metadata.orderer_signatures.len(), 1);
        assert!(handler.config_block("other").is_none());
    }
}
