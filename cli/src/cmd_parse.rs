//! `chainwatch parse` — decode one marshalled block and print its parsed view.

use anyhow::{Context, Result};
use chainwatch_core::proto::Block;
use chainwatch_parser::BlockParser;
use prost::Message;
use std::path::Path;

pub fn read_block(path: &Path) -> Result<Block> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Block::decode(bytes.as_slice()).with_context(|| format!("decoding block {}", path.display()))
}

pub fn run(file: &Path, config_block: Option<&Path>, compact: bool) -> Result<()> {
    let block = read_block(file)?;
    let config_block = config_block.map(read_block).transpose()?;

    let view = BlockParser::new()
        .parse(&block, config_block.as_ref())
        .with_context(|| format!("parsing {}", file.display()))?;

    if compact {
        println!("{}", serde_json::to_string(&view)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&view)?);
    }
    Ok(())
}
