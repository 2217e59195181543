//! `chainwatch fixtures` — write sample ledgers in the layout `replay` reads.
//!
//! `<out>/<channel>/<number>.block`, block 0 being the channel's config block.

use anyhow::{Context, Result};
use chainwatch_core::fixtures::{endorser_block, ConfigFixture};
use prost::Message;
use std::path::Path;

pub fn run(out: &Path, channels: &[String], blocks: u64) -> Result<usize> {
    let mut written = 0;
    for channel in channels {
        let dir = out.join(channel);
        std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

        let config = ConfigFixture::new(channel)
            .application_org("Org1MSP", &[("peer0.org1.example.com", 7051)])
            .orderer_org("OrdererMSP", &["orderer.example.com:7050"]);

        for number in 0..blocks {
            let block = if number == 0 {
                config.block(0)
            } else {
                endorser_block(channel, number, 2)
            };
            let path = dir.join(format!("{number:06}.block"));
            std::fs::write(&path, block.encode_to_vec())
                .with_context(|| format!("writing {}", path.display()))?;
            written += 1;
        }
    }
    Ok(written)
}
