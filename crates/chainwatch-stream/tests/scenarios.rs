//! End-to-end observation scenarios against an in-memory peer.

use chainwatch_core::fixtures::{endorser_block, endorser_chain};
use chainwatch_core::model::ChannelBlock;
use chainwatch_core::proto::Block;
use chainwatch_stream::{
    ChannelRule, FanoutHub, MemoryPeer, ObserverConfig, ParsedBlocks, PeerChannelWatcher,
    PeerStream, RawBlocks, StreamState, UnsignedIdentity,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const WAIT: Duration = Duration::from_secs(5);

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn two_channel_peer() -> MemoryPeer {
    let peer = MemoryPeer::new();
    peer.push_blocks("sample-channel", endorser_chain("sample-channel", 10));
    peer.push_blocks("fabcar-channel", endorser_chain("fabcar-channel", 12));
    peer
}

fn peer_stream<H: chainwatch_stream::BlockHandler>(
    peer: &MemoryPeer,
    config: &ObserverConfig,
    handler: H,
) -> PeerStream<H> {
    let watcher = PeerChannelWatcher::from_config(Arc::new(peer.clone()), config).unwrap();
    PeerStream::builder(
        watcher,
        Arc::new(peer.clone()),
        Arc::new(UnsignedIdentity::new("Org1MSP", "observer")),
        handler,
    )
    .config(config)
    .build()
}

async fn recv<T>(rx: &mut mpsc::Receiver<T>) -> Option<T> {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for the stream")
}

fn fast_config() -> ObserverConfig {
    ObserverConfig {
        peer_channel_observe_period_ms: 50,
        peer_stream_observe_period_ms: 50,
        connect_retry_delay_ms: 10,
        ..Default::default()
    }
}

// ─── Scenarios ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn two_channels_merged_in_order() {
    let peer = two_channel_peer();
    let ps = peer_stream(&peer, &ObserverConfig::default(), ParsedBlocks::new());
    let root = CancellationToken::new();
    let mut merged = ps.observe(&root).await.unwrap();

    let mut seen: BTreeMap<String, Vec<u64>> = BTreeMap::new();
    for _ in 0..22 {
        let block = recv(&mut merged).await.unwrap();
        seen.entry(block.channel.clone())
            .or_default()
            .push(block.block.number());
    }

    assert_eq!(seen["sample-channel"], (0..10).collect::<Vec<_>>());
    assert_eq!(seen["fabcar-channel"], (0..12).collect::<Vec<_>>());
    assert!(tokio::time::timeout(Duration::from_millis(100), merged.recv())
        .await
        .is_err());

    root.cancel();
    assert!(recv(&mut merged).await.is_none());
    ps.closed().await;
}

#[tokio::test]
async fn late_channel_is_announced() {
    let config = fast_config();
    let peer = MemoryPeer::new();
    peer.push_blocks("sample-channel", endorser_chain("sample-channel", 3));
    let ps = peer_stream(&peer, &config, RawBlocks);
    let root = CancellationToken::new();
    let mut subs = ps.observe_by_channel(&root).await.unwrap();

    let mut sample = recv(&mut subs).await.unwrap();
    assert_eq!(sample.channel, "sample-channel");
    assert_eq!(recv(&mut sample.blocks).await.unwrap().number(), Some(0));

    peer.push_blocks("fabcar-channel", endorser_chain("fabcar-channel", 12));

    // One watcher refresh, then one spawn tick.
    let bound = config.peer_channel_observe_period()
        + config.peer_stream_observe_period()
        + Duration::from_millis(500);
    let mut fabcar = tokio::time::timeout(bound, subs.recv())
        .await
        .expect("fabcar-channel not announced by the periodic loops")
        .unwrap();
    assert_eq!(fabcar.channel, "fabcar-channel");

    let mut numbers = vec![];
    for _ in 0..12 {
        numbers.push(recv(&mut fabcar.blocks).await.unwrap().number().unwrap());
    }
    assert_eq!(numbers, (0..12).collect::<Vec<_>>());

    root.cancel();
    assert!(recv(&mut subs).await.is_none());
    ps.closed().await;
}

#[tokio::test]
async fn seek_override_starts_one_block_earlier() {
    let mut config = fast_config();
    config.channels_to_match = vec![ChannelRule::named("sample-channel")];
    config.seek_from_overrides.insert("sample-channel".into(), 5);
    let peer = two_channel_peer();
    let ps = peer_stream(&peer, &config, RawBlocks);
    let root = CancellationToken::new();
    let mut merged = ps.observe(&root).await.unwrap();

    assert_eq!(recv(&mut merged).await.unwrap().number(), Some(4));

    let request = &peer.requests()[0];
    assert_eq!(request.channel, "sample-channel");
    assert_eq!(request.start, 4);
    assert_eq!(request.stop, None);
    assert_eq!(request.stop_number(), u64::MAX);

    root.cancel();
    ps.closed().await;
}

#[tokio::test]
async fn channel_filter_excludes_other_channels() {
    let mut config = fast_config();
    config.channels_to_match = vec![ChannelRule::pattern("sample-channel")];
    let peer = two_channel_peer();
    let ps = peer_stream(&peer, &config, RawBlocks);
    let root = CancellationToken::new();
    let mut merged = ps.observe(&root).await.unwrap();

    for expected in 0..10 {
        let block = recv(&mut merged).await.unwrap();
        assert_eq!(block.channel, "sample-channel");
        assert_eq!(block.number(), Some(expected));
    }
    // Let a few more ticks pass.
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(
        ps.watcher().channels().keys().collect::<Vec<_>>(),
        vec!["sample-channel"]
    );
    assert_eq!(ps.channels(), vec!["sample-channel".to_string()]);
    assert!(peer.requests().iter().all(|r| r.channel == "sample-channel"));

    root.cancel();
    ps.closed().await;
}

#[tokio::test]
async fn hub_fanout_with_early_closer() {
    let hub: FanoutHub<ChannelBlock<Block>> = FanoutHub::new();
    let (mut a, _a_closer) = hub.subscribe().await;
    let (mut b, b_closer) = hub.subscribe().await;

    let (tx, input) = mpsc::channel(1);
    hub.observe(&CancellationToken::new(), input).unwrap();
    let producer = tokio::spawn(async move {
        for block in endorser_chain("sample-channel", 100) {
            tx.send(ChannelBlock::new("sample-channel", block)).await.unwrap();
        }
    });

    let reader_a = tokio::spawn(async move {
        let mut numbers = vec![];
        while let Some(block) = a.recv().await {
            numbers.push(block.number().unwrap());
        }
        numbers
    });
    let reader_b = tokio::spawn(async move {
        let mut numbers = vec![];
        while let Some(block) = b.recv().await {
            numbers.push(block.number().unwrap());
            if numbers.len() == 42 {
                b_closer.close().await;
                break;
            }
        }
        // Anything still buffered in the lane, then the close.
        let mut after_close = 0;
        while b.recv().await.is_some() {
            after_close += 1;
        }
        (numbers, after_close)
    });

    producer.await.expect("producer panicked");
    let a = tokio::time::timeout(WAIT, reader_a).await.unwrap().unwrap();
    let (b, after_close) = tokio::time::timeout(WAIT, reader_b).await.unwrap().unwrap();

    assert_eq!(a, (0..100).collect::<Vec<_>>());
    assert_eq!(b, (0..42).collect::<Vec<_>>());
    assert!(after_close <= 1);
    hub.closed().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn shutdown_under_load_closes_everything() {
    const CHANNELS: [&str; 4] = ["ch-a", "ch-b", "ch-c", "ch-d"];

    let peer = MemoryPeer::new();
    for channel in CHANNELS {
        peer.push_blocks(channel, endorser_chain(channel, 5));
    }
    let writer_stop = CancellationToken::new();
    let writer = {
        let peer = peer.clone();
        let stop = writer_stop.clone();
        tokio::spawn(async move {
            let mut next = 5;
            while !stop.is_cancelled() {
                for channel in CHANNELS {
                    peer.push_block(channel, endorser_block(channel, next, 1));
                }
                next += 1;
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
    };

    let ps = peer_stream(&peer, &fast_config(), RawBlocks);
    let hub = FanoutHub::new();
    let (mut lane, _closer) = hub.subscribe().await;

    let root = CancellationToken::new();
    let merged = ps.observe(&root).await.unwrap();
    hub.observe(&root, merged).unwrap();

    let mut last: BTreeMap<String, u64> = BTreeMap::new();
    for _ in 0..200 {
        let block = recv(&mut lane).await.unwrap();
        let n = block.number().unwrap();
        if let Some(prev) = last.insert(block.channel.clone(), n) {
            assert!(n > prev, "channel {} went from {prev} to {n}", block.channel);
        }
    }
    assert_eq!(ps.channels().len(), 4);

    root.cancel();
    tokio::time::timeout(WAIT, async {
        while lane.recv().await.is_some() {}
    })
    .await
    .expect("subscriber lane did not close");
    tokio::time::timeout(WAIT, ps.closed())
        .await
        .expect("peer stream tasks did not exit");
    tokio::time::timeout(WAIT, hub.closed())
        .await
        .expect("hub task did not exit");

    writer_stop.cancel();
    writer.await.unwrap();

    assert_eq!(peer.open_deliveries(), 0);
    assert!(ps
        .statuses()
        .values()
        .all(|s| s.state == StreamState::Stopped));
    assert!(!ps.watcher().is_observing());
}
