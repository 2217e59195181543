//! `ChannelStream` — block delivery for one channel, with reconnects.
//!
//! The stream connects to the deliver service from a computed start block,
//! hands each block to a [`BlockHandler`] and sends the result downstream
//! with back-pressure. Transport failures and upstream EOF reconnect after
//! the retry delay, resuming after the last emitted block.

use chainwatch_core::error::{DeliverError, ObserverError, StreamError};
use chainwatch_core::hooks::{NoopHooks, StreamHooks};
use chainwatch_core::{BlocksDeliverer, Delivery, SeekRequest, SigningIdentity};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::config::ObserverConfig;
use crate::handler::BlockHandler;
use crate::retry::RetryPolicy;
use crate::seek::SeekFromFetcher;

// ─── Status ──────────────────────────────────────────────────────────────────

/// Lifecycle of a channel stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    #[default]
    Created,
    Connecting,
    Connected,
    Errored,
    Stopped,
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Errored => write!(f, "errored"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Snapshot of a channel stream's state and counters.
#[derive(Debug, Clone, Default)]
pub struct StreamStatus {
    pub state: StreamState,
    pub connect_attempt: u64,
    pub connect_attempt_at: Option<DateTime<Utc>>,
    pub connected_at: Option<DateTime<Utc>>,
    pub last_error: Option<StreamError>,
    pub last_error_at: Option<DateTime<Utc>>,
    /// Number of the last emitted block.
    pub last_block: Option<u64>,
    pub blocks_received: u64,
    pub blocks_emitted: u64,
    pub parse_errors: u64,
    pub transform_errors: u64,
    pub reconnections: u64,
}

// ─── Options ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ChannelStreamOptions {
    /// Terminate on orderly upstream end instead of reconnecting.
    pub stop_recreate_stream: bool,
    pub retry: RetryPolicy,
    /// Terminate after emitting this block (`None` = follow forever).
    pub stop_at: Option<u64>,
    /// Capacity of the output channel.
    pub capacity: usize,
}

impl Default for ChannelStreamOptions {
    fn default() -> Self {
        Self {
            stop_recreate_stream: false,
            retry: RetryPolicy::default(),
            stop_at: None,
            capacity: 1,
        }
    }
}

impl ChannelStreamOptions {
    pub fn from_config(config: &ObserverConfig) -> Self {
        Self {
            stop_recreate_stream: config.stop_recreate_stream,
            retry: RetryPolicy::fixed(config.connect_retry_delay()),
            stop_at: None,
            capacity: config.channel_capacity,
        }
    }
}

enum Ended {
    Cancelled,
    ReceiverDropped,
    StopReached,
    Eof,
    Failed(DeliverError),
}

// ─── Stream ──────────────────────────────────────────────────────────────────

pub struct ChannelStream<H: BlockHandler> {
    channel: String,
    deliverer: Arc<dyn BlocksDeliverer>,
    identity: Arc<dyn SigningIdentity>,
    seek_from: Arc<dyn SeekFromFetcher>,
    handler: Arc<H>,
    hooks: Arc<dyn StreamHooks>,
    options: ChannelStreamOptions,
    status: watch::Sender<StreamStatus>,
    cancel: Mutex<Option<CancellationToken>>,
    tracker: TaskTracker,
}

impl<H: BlockHandler> ChannelStream<H> {
    pub fn new(
        channel: impl Into<String>,
        deliverer: Arc<dyn BlocksDeliverer>,
        identity: Arc<dyn SigningIdentity>,
        seek_from: Arc<dyn SeekFromFetcher>,
        handler: Arc<H>,
    ) -> Self {
        Self {
            channel: channel.into(),
            deliverer,
            identity,
            seek_from,
            handler,
            hooks: Arc::new(NoopHooks),
            options: ChannelStreamOptions::default(),
            status: watch::channel(StreamStatus::default()).0,
            cancel: Mutex::new(None),
            tracker: TaskTracker::new(),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn StreamHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_options(mut self, options: ChannelStreamOptions) -> Self {
        self.options = options;
        self
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Start streaming. The returned receiver closes once the stream
    /// terminates: on cancellation of `parent`, [`stop`](Self::stop), a
    /// reached stop block, an orderly upstream end with
    /// `stop_recreate_stream`, or an exhausted retry policy.
    pub fn observe(
        self: &Arc<Self>,
        parent: &CancellationToken,
    ) -> Result<mpsc::Receiver<H::Output>, ObserverError> {
        let cancel = {
            let mut slot = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.is_some() {
                return Err(ObserverError::AlreadyObserving {
                    component: "channel stream",
                });
            }
            let token = parent.child_token();
            *slot = Some(token.clone());
            token
        };

        let (tx, rx) = mpsc::channel(self.options.capacity.max(1));
        self.tracker.spawn(Arc::clone(self).run(cancel, tx));
        Ok(rx)
    }

    /// Stop the stream. Idempotent.
    pub fn stop(&self) {
        if let Some(token) = self.cancel.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
            token.cancel();
        }
    }

    /// Wait until the stream task has exited.
    pub async fn closed(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }

    pub fn status(&self) -> StreamStatus {
        self.status.borrow().clone()
    }

    pub fn state(&self) -> StreamState {
        self.status.borrow().state
    }

    pub fn last_error(&self) -> Option<StreamError> {
        self.status.borrow().last_error.clone()
    }

    /// Receiver notified on every status change.
    pub fn watch_status(&self) -> watch::Receiver<StreamStatus> {
        self.status.subscribe()
    }

    async fn run(self: Arc<Self>, cancel: CancellationToken, tx: mpsc::Sender<H::Output>) {
        let mut resume_after: Option<u64> = None;
        let mut attempt: u32 = 0;

        loop {
            self.status.send_modify(|s| {
                s.state = StreamState::Connecting;
                s.connect_attempt += 1;
                s.connect_attempt_at = Some(Utc::now());
            });

            let connected = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                r = self.connect(&cancel, resume_after) => r,
            };
            let mut delivery = match connected {
                Ok(Some(delivery)) => delivery,
                Ok(None) => break,
                Err(e) => {
                    attempt = attempt.saturating_add(1);
                    warn!(channel = %self.channel, attempt, error = %e, "connect failed");
                    self.record_error(e);
                    if !self.backoff(&cancel, attempt).await {
                        break;
                    }
                    continue;
                }
            };

            attempt = 0;
            self.status.send_modify(|s| {
                s.state = StreamState::Connected;
                s.connected_at = Some(Utc::now());
            });
            info!(channel = %self.channel, "connected to deliver service");

            let ended = self.receive(&cancel, &mut delivery, &tx, &mut resume_after).await;
            delivery.close();

            match ended {
                Ended::Cancelled | Ended::ReceiverDropped | Ended::StopReached => break,
                Ended::Eof if self.options.stop_recreate_stream => {
                    info!(channel = %self.channel, "upstream ended, not recreating");
                    break;
                }
                Ended::Eof => {
                    info!(channel = %self.channel, "upstream ended, reconnecting");
                }
                Ended::Failed(e) => {
                    warn!(channel = %self.channel, error = %e, "delivery failed, reconnecting");
                    self.record_error(e.into());
                }
            }
            attempt = 1;
            if !self.backoff(&cancel, attempt).await {
                break;
            }
        }

        self.status.send_modify(|s| s.state = StreamState::Stopped);
        info!(channel = %self.channel, "channel stream stopped");
    }

    /// Open a delivery. `Ok(None)` when the stop block was already emitted.
    async fn connect(
        &self,
        cancel: &CancellationToken,
        resume_after: Option<u64>,
    ) -> Result<Option<Delivery>, StreamError> {
        let start = match resume_after {
            Some(n) => n.saturating_add(1),
            None => self.seek_from.seek_from(&self.channel).await?,
        };
        if self.options.stop_at.is_some_and(|stop| start > stop) {
            return Ok(None);
        }
        let request = SeekRequest::new(
            self.channel.clone(),
            start,
            self.options.stop_at,
            self.identity.as_ref(),
        )?;
        debug!(channel = %self.channel, start, "opening delivery");
        let delivery = self.deliverer.deliver(cancel.child_token(), request).await?;
        Ok(Some(delivery))
    }

    async fn receive(
        &self,
        cancel: &CancellationToken,
        delivery: &mut Delivery,
        tx: &mpsc::Sender<H::Output>,
        resume_after: &mut Option<u64>,
    ) -> Ended {
        let channel = self.channel.as_str();
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ended::Cancelled,
                next = delivery.blocks.next() => next,
            };
            let block = match next {
                None => return Ended::Eof,
                Some(Err(e)) => return Ended::Failed(e),
                Some(Ok(block)) => block,
            };
            self.status.send_modify(|s| s.blocks_received += 1);

            let number = block.number();
            if let (Some(n), Some(last)) = (number, *resume_after) {
                if n <= last {
                    debug!(channel, block = n, "skipping block already emitted or dropped");
                    continue;
                }
            }

            let started = Instant::now();
            let handled = match self.handler.handle(channel, block) {
                Ok(handled) => handled,
                Err(e) => {
                    warn!(channel, block = ?number, error = %e, "dropping unparseable block");
                    self.hooks.on_parse_error(channel);
                    self.status.send_modify(|s| s.parse_errors += 1);
                    self.record_error(StreamError::Parse {
                        block: number,
                        source: e,
                    });
                    // Skipped for good; a reconnect must not fetch it again.
                    if number.is_some() {
                        *resume_after = number;
                    }
                    continue;
                }
            };
            if H::PARSES {
                self.hooks.on_block_parsed(channel, started.elapsed());
            }
            if !handled.transform_errors.is_empty() {
                for e in &handled.transform_errors {
                    self.hooks.on_transform_error(channel, e.transformer());
                }
                let failed = handled.transform_errors.len() as u64;
                self.status.send_modify(|s| s.transform_errors += failed);
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ended::Cancelled,
                sent = tx.send(handled.item) => {
                    if sent.is_err() {
                        debug!(channel, "receiver dropped");
                        return Ended::ReceiverDropped;
                    }
                }
            }

            if number.is_some() {
                *resume_after = number;
            }
            self.status.send_modify(|s| {
                s.blocks_emitted += 1;
                s.last_block = number.or(s.last_block);
            });
            if let Some(n) = number {
                self.hooks.on_block_emitted(channel, n);
                if self.options.stop_at.is_some_and(|stop| n >= stop) {
                    info!(channel, block = n, "stop block reached");
                    return Ended::StopReached;
                }
            }
        }
    }

    /// Wait before the next connect. `false` when cancelled or retries are
    /// exhausted.
    async fn backoff(&self, cancel: &CancellationToken, attempt: u32) -> bool {
        let Some(delay) = self.options.retry.next_delay(attempt) else {
            warn!(channel = %self.channel, attempt, "retries exhausted, giving up");
            return false;
        };
        let mut reconnections = 0;
        self.status.send_modify(|s| {
            s.reconnections += 1;
            reconnections = s.reconnections;
        });
        self.hooks.on_reconnect(&self.channel, reconnections);
        debug!(channel = %self.channel, ?delay, "waiting before reconnect");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }

    fn record_error(&self, error: StreamError) {
        let errored = !matches!(error, StreamError::Parse { .. });
        self.status.send_modify(|s| {
            if errored {
                s.state = StreamState::Errored;
            }
            s.last_error = Some(error);
            s.last_error_at = Some(Utc::now());
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{ParsedBlocks, RawBlocks};
    use crate::memory::{MemoryPeer, UnsignedIdentity};
    use crate::seek::{FixedSeek, NewestSeek, OldestSeek};
    use chainwatch_core::fixtures::{endorser_block, endorser_chain, BlockBuilder};
    use chainwatch_core::model::ChannelBlock;
    use chainwatch_core::proto::Block;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    fn options() -> ChannelStreamOptions {
        ChannelStreamOptions {
            retry: RetryPolicy::fixed(Duration::from_millis(10)),
            ..Default::default()
        }
    }

    fn stream<H: BlockHandler>(
        peer: &MemoryPeer,
        seek: Arc<dyn SeekFromFetcher>,
        handler: H,
        options: ChannelStreamOptions,
    ) -> Arc<ChannelStream<H>> {
        Arc::new(
            ChannelStream::new(
                "c",
                Arc::new(peer.clone()),
                Arc::new(UnsignedIdentity::new("Org1MSP", "client")),
                seek,
                Arc::new(handler),
            )
            .with_options(options),
        )
    }

    async fn recv<T>(rx: &mut mpsc::Receiver<T>) -> Option<T> {
        tokio::time::timeout(WAIT, rx.recv()).await.expect("timed out waiting for block")
    }

    async fn numbers(rx: &mut mpsc::Receiver<ChannelBlock<Block>>, n: usize) -> Vec<u64> {
        let mut out = Vec::new();
        for _ in 0..n {
            out.push(recv(rx).await.unwrap().number().unwrap());
        }
        out
    }

    #[tokio::test]
    async fn emits_from_start_and_closes_on_eof() {
        let peer = MemoryPeer::finite();
        peer.push_blocks("c", endorser_chain("c", 5));
        let s = stream(
            &peer,
            Arc::new(FixedSeek(2)),
            RawBlocks,
            ChannelStreamOptions {
                stop_recreate_stream: true,
                ..options()
            },
        );
        let mut rx = s.observe(&CancellationToken::new()).unwrap();

        assert_eq!(numbers(&mut rx, 3).await, vec![2, 3, 4]);
        assert!(recv(&mut rx).await.is_none());
        s.closed().await;

        let status = s.status();
        assert_eq!(status.state, StreamState::Stopped);
        assert_eq!(status.blocks_emitted, 3);
        assert_eq!(status.last_block, Some(4));
        assert!(status.connected_at.is_some());
        assert_eq!(peer.open_deliveries(), 0);
    }

    #[tokio::test]
    async fn transport_failure_resumes_without_duplicates() {
        let peer = MemoryPeer::new();
        peer.push_blocks("c", endorser_chain("c", 6));
        peer.break_next_delivery_after("c", 3);
        let s = stream(&peer, Arc::new(OldestSeek), RawBlocks, options());
        let root = CancellationToken::new();
        let mut rx = s.observe(&root).unwrap();

        assert_eq!(numbers(&mut rx, 6).await, vec![0, 1, 2, 3, 4, 5]);
        let starts: Vec<_> = peer.requests().iter().map(|r| r.start).collect();
        assert_eq!(starts, vec![0, 3]);

        let status = s.status();
        assert_eq!(status.reconnections, 1);
        assert!(matches!(
            status.last_error,
            Some(StreamError::Deliver(DeliverError::Closed))
        ));

        root.cancel();
        s.closed().await;
        assert_eq!(peer.open_deliveries(), 0);
    }

    #[tokio::test]
    async fn connect_failures_are_retried() {
        let peer = MemoryPeer::new();
        peer.push_blocks("c", endorser_chain("c", 1));
        peer.fail_next_deliveries("c", 2);
        let s = stream(&peer, Arc::new(OldestSeek), RawBlocks, options());
        let root = CancellationToken::new();
        let mut rx = s.observe(&root).unwrap();

        assert_eq!(numbers(&mut rx, 1).await, vec![0]);
        let status = s.status();
        assert_eq!(status.connect_attempt, 3);
        assert_eq!(status.reconnections, 2);
        assert_eq!(status.state, StreamState::Connected);

        root.cancel();
        s.closed().await;
    }

    #[tokio::test]
    async fn eof_reconnects_after_last_emitted() {
        let peer = MemoryPeer::finite();
        peer.push_blocks("c", endorser_chain("c", 3));
        let s = stream(&peer, Arc::new(OldestSeek), RawBlocks, options());
        let root = CancellationToken::new();
        let mut rx = s.observe(&root).unwrap();

        assert_eq!(numbers(&mut rx, 3).await, vec![0, 1, 2]);
        peer.push_blocks("c", vec![endorser_block("c", 3, 1), endorser_block("c", 4, 1)]);
        assert_eq!(numbers(&mut rx, 2).await, vec![3, 4]);

        let requests = peer.requests();
        assert_eq!(requests[0].start, 0);
        assert!(requests[1..].iter().all(|r| r.start >= 3));

        root.cancel();
        assert!(recv(&mut rx).await.is_none());
        s.closed().await;
        assert_eq!(peer.open_deliveries(), 0);
    }

    #[tokio::test]
    async fn unparseable_block_is_dropped() {
        let peer = MemoryPeer::new();
        peer.push_blocks(
            "c",
            vec![
                endorser_block("c", 0, 1),
                BlockBuilder::new(1).envelope(vec![0x0a, 0x05, 0x01]).build(),
                endorser_block("c", 2, 1),
            ],
        );
        let s = stream(&peer, Arc::new(OldestSeek), ParsedBlocks::new(), options());
        let root = CancellationToken::new();
        let mut rx = s.observe(&root).unwrap();

        assert_eq!(recv(&mut rx).await.unwrap().number(), Some(0));
        assert_eq!(recv(&mut rx).await.unwrap().number(), Some(2));

        let status = s.status();
        assert_eq!(status.parse_errors, 1);
        assert_eq!(status.blocks_received, 3);
        assert!(matches!(
            status.last_error,
            Some(StreamError::Parse { block: Some(1), .. })
        ));
        assert_eq!(status.state, StreamState::Connected);

        root.cancel();
        s.closed().await;
    }

    #[tokio::test]
    async fn dropped_block_is_not_fetched_again() {
        let peer = MemoryPeer::new();
        peer.push_blocks(
            "c",
            vec![
                endorser_block("c", 0, 1),
                BlockBuilder::new(1).envelope(vec![0x0a, 0x05, 0x01]).build(),
                endorser_block("c", 2, 1),
                endorser_block("c", 3, 1),
            ],
        );
        peer.break_next_delivery_after("c", 2);
        let s = stream(&peer, Arc::new(OldestSeek), ParsedBlocks::new(), options());
        let root = CancellationToken::new();
        let mut rx = s.observe(&root).unwrap();

        assert_eq!(recv(&mut rx).await.unwrap().number(), Some(0));
        assert_eq!(recv(&mut rx).await.unwrap().number(), Some(2));
        assert_eq!(recv(&mut rx).await.unwrap().number(), Some(3));

        let starts: Vec<_> = peer.requests().iter().map(|r| r.start).collect();
        assert_eq!(starts, vec![0, 2]);
        let status = s
            .watch_status()
            .wait_for(|s| s.last_block == Some(3))
            .await
            .unwrap()
            .clone();
        assert_eq!(status.parse_errors, 1);
        assert_eq!(status.blocks_emitted, 3);

        root.cancel();
        s.closed().await;
    }

    #[derive(Default)]
    struct CountingHooks {
        parsed: AtomicUsize,
        emitted: AtomicUsize,
    }

    impl StreamHooks for CountingHooks {
        fn on_block_parsed(&self, _channel: &str, _elapsed: Duration) {
            self.parsed.fetch_add(1, Ordering::SeqCst);
        }

        fn on_block_emitted(&self, _channel: &str, _block: u64) {
            self.emitted.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn count_hooks<H: BlockHandler>(handler: H) -> (usize, usize) {
        let peer = MemoryPeer::finite();
        peer.push_blocks("c", endorser_chain("c", 3));
        let hooks = Arc::new(CountingHooks::default());
        let s = Arc::new(
            ChannelStream::new(
                "c",
                Arc::new(peer.clone()),
                Arc::new(UnsignedIdentity::new("Org1MSP", "client")),
                Arc::new(OldestSeek),
                Arc::new(handler),
            )
            .with_hooks(hooks.clone())
            .with_options(ChannelStreamOptions {
                stop_recreate_stream: true,
                ..options()
            }),
        );
        let mut rx = s.observe(&CancellationToken::new()).unwrap();
        while recv(&mut rx).await.is_some() {}
        s.closed().await;
        (
            hooks.parsed.load(Ordering::SeqCst),
            hooks.emitted.load(Ordering::SeqCst),
        )
    }

    #[tokio::test]
    async fn parse_latency_only_for_parsing_handlers() {
        assert_eq!(count_hooks(RawBlocks).await, (0, 3));
        assert_eq!(count_hooks(ParsedBlocks::new()).await, (3, 3));
    }

    #[tokio::test]
    async fn stop_block_terminates() {
        let peer = MemoryPeer::new();
        peer.push_blocks("c", endorser_chain("c", 5));
        let s = stream(
            &peer,
            Arc::new(OldestSeek),
            RawBlocks,
            ChannelStreamOptions {
                stop_at: Some(2),
                ..options()
            },
        );
        let mut rx = s.observe(&CancellationToken::new()).unwrap();
        assert_eq!(numbers(&mut rx, 3).await, vec![0, 1, 2]);
        assert!(recv(&mut rx).await.is_none());
        assert_eq!(peer.requests()[0].stop, Some(2));
        s.closed().await;
    }

    #[tokio::test]
    async fn observing_twice_is_rejected() {
        let peer = MemoryPeer::new();
        peer.add_channel("c");
        let s = stream(&peer, Arc::new(OldestSeek), RawBlocks, options());
        let root = CancellationToken::new();
        let _rx = s.observe(&root).unwrap();
        assert!(matches!(
            s.observe(&root),
            Err(ObserverError::AlreadyObserving { .. })
        ));
        s.stop();
        s.stop();
        s.closed().await;
        assert_eq!(s.state(), StreamState::Stopped);
    }

    #[tokio::test]
    async fn cancellation_closes_output_and_delivery() {
        let peer = MemoryPeer::new();
        peer.push_blocks("c", endorser_chain("c", 1));
        let s = stream(&peer, Arc::new(OldestSeek), RawBlocks, options());
        let root = CancellationToken::new();
        let mut rx = s.observe(&root).unwrap();
        let mut status = s.watch_status();

        assert_eq!(numbers(&mut rx, 1).await, vec![0]);
        status
            .wait_for(|s| s.state == StreamState::Connected)
            .await
            .unwrap();
        assert_eq!(peer.open_deliveries(), 1);

        root.cancel();
        assert!(recv(&mut rx).await.is_none());
        s.closed().await;
        assert_eq!(peer.open_deliveries(), 0);
        assert_eq!(s.state(), StreamState::Stopped);
    }

    #[tokio::test]
    async fn seek_failure_is_retried() {
        let peer = MemoryPeer::new();
        peer.add_channel("c");
        let s = stream(&peer, Arc::new(NewestSeek::new(Arc::new(peer.clone()))), RawBlocks, options());
        let root = CancellationToken::new();
        let mut rx = s.observe(&root).unwrap();

        let mut status = s.watch_status();
        let errored = status
            .wait_for(|s| matches!(s.last_error, Some(StreamError::Seek(_))))
            .await
            .unwrap()
            .clone();
        assert!(errored.reconnections <= errored.connect_attempt);

        peer.push_blocks("c", endorser_chain("c", 1));
        assert_eq!(numbers(&mut rx, 1).await, vec![0]);

        root.cancel();
        s.closed().await;
    }

    #[test]
    fn state_display() {
        assert_eq!(StreamState::Errored.to_string(), "errored");
        assert_eq!(StreamState::default(), StreamState::Created);
    }
}
