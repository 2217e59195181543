//! `chainwatch replay` — run on-disk ledgers through the observation pipeline.
//!
//! Each sub-directory of `--dir` is one channel; its `*.block` files are
//! loaded into an in-memory peer. Blocks flow through `PeerStream` (parsed,
//! optionally transformed) into a `FanoutHub`, and one hub lane is written to
//! the output as JSON lines.

use anyhow::{bail, Context, Result};
use chainwatch_core::proto::Block;
use chainwatch_observability::ChainWatchMetrics;
use chainwatch_stream::{
    FanoutHub, MemoryPeer, ObserverConfig, ParsedBlocks, PeerChannelWatcher, PeerStream,
    StreamStatus, UnsignedIdentity,
};
use chainwatch_transform::{KeyReplace, TransformerChain};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::cmd_parse::read_block;

pub struct ReplayOptions {
    pub limit: Option<usize>,
    pub idle: Duration,
    pub lifecycle_keys: bool,
}

pub struct ReplaySummary {
    pub blocks: usize,
    pub channels: BTreeMap<String, StreamStatus>,
}

/// Load every `<dir>/<channel>/*.block` into a peer whose deliveries end at
/// the last stored block.
pub fn load_ledgers(dir: &Path) -> Result<MemoryPeer> {
    let mut ledgers: BTreeMap<String, Vec<Block>> = BTreeMap::new();

    let walker = WalkDir::new(dir).min_depth(1).max_depth(2).sort_by_file_name();
    for entry in walker {
        let entry = entry.with_context(|| format!("walking {}", dir.display()))?;
        let path = entry.path();
        if entry.depth() == 1 {
            if entry.file_type().is_dir() {
                ledgers.entry(file_name(path)).or_default();
            }
            continue;
        }
        if !entry.file_type().is_file() || path.extension().map_or(true, |ext| ext != "block") {
            continue;
        }
        let Some(channel_dir) = path.parent() else {
            continue;
        };
        ledgers
            .entry(file_name(channel_dir))
            .or_default()
            .push(read_block(path)?);
    }

    if ledgers.is_empty() {
        bail!("no channel directories found in '{}'", dir.display());
    }

    let peer = MemoryPeer::finite();
    for (channel, mut blocks) in ledgers {
        blocks.sort_by_key(|b| b.number());
        debug!(%channel, blocks = blocks.len(), "loaded ledger");
        peer.add_channel(&channel);
        peer.push_blocks(&channel, blocks);
    }
    Ok(peer)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub async fn run(
    dir: &Path,
    mut config: ObserverConfig,
    options: ReplayOptions,
    out: &mut impl Write,
) -> Result<ReplaySummary> {
    let peer = load_ledgers(dir)?;
    // A finite ledger ends every delivery; do not reconnect.
    config.stop_recreate_stream = true;
    config.validate()?;

    let mut transformers = TransformerChain::new();
    if options.lifecycle_keys {
        transformers = transformers.with(KeyReplace::lifecycle());
    }
    let metrics = ChainWatchMetrics::new(&opentelemetry::global::meter("chainwatch"));

    let watcher = PeerChannelWatcher::from_config(Arc::new(peer.clone()), &config)?;
    let ps = PeerStream::builder(
        watcher,
        Arc::new(peer.clone()),
        Arc::new(UnsignedIdentity::new("ReplayMSP", "chainwatch")),
        ParsedBlocks::new().with_transformers(transformers),
    )
    .config(&config)
    .hooks(Arc::new(metrics))
    .build();

    let hub = FanoutHub::new();
    let (mut lane, _closer) = hub.subscribe().await;

    let root = CancellationToken::new();
    let merged = ps.observe(&root).await?;
    hub.observe(&root, merged)?;

    let mut blocks = 0;
    loop {
        if options.limit.is_some_and(|limit| blocks >= limit) {
            break;
        }
        let block = match tokio::time::timeout(options.idle, lane.recv()).await {
            Ok(Some(block)) => block,
            Ok(None) => break,
            Err(_) => {
                debug!(idle_ms = options.idle.as_millis() as u64, "replay idle");
                break;
            }
        };
        let line = serde_json::json!({ "channel": block.channel, "block": block.block });
        writeln!(out, "{}", serde_json::to_string(&line)?)?;
        blocks += 1;
    }

    root.cancel();
    ps.closed().await;
    hub.closed().await;
    info!(blocks, "replay finished");

    Ok(ReplaySummary {
        blocks,
        channels: ps.statuses(),
    })
}
