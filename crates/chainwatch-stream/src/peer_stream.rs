//! `PeerStream` — one channel stream per discovered channel.
//!
//! A ticker diffs the watcher's snapshot against the streams already
//! running and spawns a [`ChannelStream`] for each new channel. Output is
//! either merged into one receiver or announced per channel.

use chainwatch_core::error::ObserverError;
use chainwatch_core::hooks::{NoopHooks, StreamHooks};
use chainwatch_core::{BlocksDeliverer, SigningIdentity};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

use crate::channel_stream::{ChannelStream, ChannelStreamOptions, StreamStatus};
use crate::config::ObserverConfig;
use crate::handler::BlockHandler;
use crate::seek::{self, OldestSeek, SeekFromFetcher};
use crate::watcher::PeerChannelWatcher;

/// A newly spawned channel and its block receiver.
#[derive(Debug)]
pub struct ChannelSubscription<T> {
    pub channel: String,
    pub blocks: mpsc::Receiver<T>,
}

enum Sink<T> {
    Merged(mpsc::Sender<T>),
    PerChannel(mpsc::Sender<ChannelSubscription<T>>),
}

pub struct PeerStreamBuilder<H: BlockHandler> {
    watcher: PeerChannelWatcher,
    deliverer: Arc<dyn BlocksDeliverer>,
    identity: Arc<dyn SigningIdentity>,
    handler: Arc<H>,
    hooks: Arc<dyn StreamHooks>,
    fallback: Arc<dyn SeekFromFetcher>,
    overrides: BTreeMap<String, u64>,
    period: Duration,
    options: ChannelStreamOptions,
}

impl<H: BlockHandler> PeerStreamBuilder<H> {
    /// Apply periods, overrides, reconnect settings and the fallback start
    /// position from `config`.
    pub fn config(mut self, config: &ObserverConfig) -> Self {
        self.period = config.peer_stream_observe_period();
        self.overrides = config.seek_from_overrides.clone();
        self.options = ChannelStreamOptions::from_config(config);
        self.fallback = seek::from_config(config.seek_from, self.watcher.discovery());
        self
    }

    /// Start position for channels without an override.
    pub fn seek_from(mut self, fetcher: Arc<dyn SeekFromFetcher>) -> Self {
        self.fallback = fetcher;
        self
    }

    /// Resume `channel` after block `value`; delivery starts at `value - 1`.
    pub fn seek_override(mut self, channel: impl Into<String>, value: u64) -> Self {
        self.overrides.insert(channel.into(), value);
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn StreamHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn stream_options(mut self, options: ChannelStreamOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> PeerStream<H> {
        PeerStream {
            inner: Arc::new(PeerInner {
                watcher: self.watcher,
                deliverer: self.deliverer,
                identity: self.identity,
                handler: self.handler,
                hooks: self.hooks,
                fallback: self.fallback,
                overrides: self.overrides,
                period: self.period.max(Duration::from_millis(1)),
                options: self.options,
                streams: RwLock::new(BTreeMap::new()),
                cancel: Mutex::new(None),
                owns_watcher: AtomicBool::new(false),
                tracker: TaskTracker::new(),
            }),
        }
    }
}

/// All matching channels of one peer. Cloning is cheap.
pub struct PeerStream<H: BlockHandler> {
    inner: Arc<PeerInner<H>>,
}

impl<H: BlockHandler> Clone for PeerStream<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct PeerInner<H: BlockHandler> {
    watcher: PeerChannelWatcher,
    deliverer: Arc<dyn BlocksDeliverer>,
    identity: Arc<dyn SigningIdentity>,
    handler: Arc<H>,
    hooks: Arc<dyn StreamHooks>,
    fallback: Arc<dyn SeekFromFetcher>,
    overrides: BTreeMap<String, u64>,
    period: Duration,
    options: ChannelStreamOptions,
    streams: RwLock<BTreeMap<String, Arc<ChannelStream<H>>>>,
    cancel: Mutex<Option<CancellationToken>>,
    owns_watcher: AtomicBool,
    tracker: TaskTracker,
}

impl<H: BlockHandler> PeerStream<H> {
    pub fn builder(
        watcher: PeerChannelWatcher,
        deliverer: Arc<dyn BlocksDeliverer>,
        identity: Arc<dyn SigningIdentity>,
        handler: H,
    ) -> PeerStreamBuilder<H> {
        PeerStreamBuilder {
            watcher,
            deliverer,
            identity,
            handler: Arc::new(handler),
            hooks: Arc::new(NoopHooks),
            fallback: Arc::new(OldestSeek),
            overrides: BTreeMap::new(),
            period: Duration::from_secs(10),
            options: ChannelStreamOptions::default(),
        }
    }

    pub fn watcher(&self) -> &PeerChannelWatcher {
        &self.inner.watcher
    }

    pub fn handler(&self) -> &Arc<H> {
        &self.inner.handler
    }

    /// Blocks of every channel in one receiver. Per-channel order is kept;
    /// channels interleave freely. The receiver closes once `parent` is
    /// cancelled or [`stop`](Self::stop) is called.
    pub async fn observe(
        &self,
        parent: &CancellationToken,
    ) -> Result<mpsc::Receiver<H::Output>, ObserverError> {
        let cancel = self.start(parent).await?;
        let (tx, rx) = mpsc::channel(self.inner.options.capacity.max(1));
        self.spawn_loop(cancel, Sink::Merged(tx));
        Ok(rx)
    }

    /// One subscription per channel, announced when its stream is spawned.
    pub async fn observe_by_channel(
        &self,
        parent: &CancellationToken,
    ) -> Result<mpsc::Receiver<ChannelSubscription<H::Output>>, ObserverError> {
        let cancel = self.start(parent).await?;
        let (tx, rx) = mpsc::channel(self.inner.options.capacity.max(1));
        self.spawn_loop(cancel, Sink::PerChannel(tx));
        Ok(rx)
    }

    async fn start(&self, parent: &CancellationToken) -> Result<CancellationToken, ObserverError> {
        let cancel = {
            let mut slot = self.inner.cancel.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.is_some() {
                return Err(ObserverError::AlreadyObserving {
                    component: "peer stream",
                });
            }
            let token = parent.child_token();
            *slot = Some(token.clone());
            token
        };
        // No-op when the caller already runs the watcher.
        if self.inner.watcher.observe(&cancel).await {
            self.inner.owns_watcher.store(true, Ordering::SeqCst);
        }
        Ok(cancel)
    }

    fn spawn_loop(&self, cancel: CancellationToken, sink: Sink<H::Output>) {
        let peer = self.clone();
        self.inner.tracker.spawn(async move {
            let mut ticker = tokio::time::interval(peer.inner.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                if !peer.spawn_new(&cancel, &sink).await {
                    break;
                }
            }
            debug!("peer stream spawn loop stopped");
        });
    }

    /// Spawn streams for channels not seen before. `false` once nobody
    /// listens to the output anymore.
    async fn spawn_new(&self, cancel: &CancellationToken, sink: &Sink<H::Output>) -> bool {
        let new: Vec<String> = {
            let streams = self.inner.streams.read().unwrap_or_else(PoisonError::into_inner);
            self.inner
                .watcher
                .channel_names()
                .into_iter()
                .filter(|name| !streams.contains_key(name))
                .collect()
        };

        for channel in new {
            let stream = Arc::new(self.channel_stream(&channel));
            let blocks = match stream.observe(cancel) {
                Ok(rx) => rx,
                Err(e) => {
                    debug!(channel = %channel, error = %e, "channel stream not started");
                    continue;
                }
            };
            self.inner
                .streams
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(channel.clone(), stream);
            self.inner.hooks.on_channel_spawned(&channel);
            info!(channel = %channel, "spawned channel stream");

            match sink {
                Sink::Merged(tx) => self.spawn_pump(cancel.child_token(), blocks, tx.clone()),
                Sink::PerChannel(tx) => {
                    let subscription = ChannelSubscription { channel, blocks };
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return false,
                        sent = tx.send(subscription) => {
                            if sent.is_err() {
                                return false;
                            }
                        }
                    }
                }
            }
        }

        match sink {
            Sink::Merged(tx) => !tx.is_closed(),
            Sink::PerChannel(tx) => !tx.is_closed(),
        }
    }

    fn channel_stream(&self, channel: &str) -> ChannelStream<H> {
        let inner = &self.inner;
        let seek_from = match inner.overrides.get(channel) {
            Some(&value) => {
                info!(channel, value, "using seek override");
                seek::from_override(value)
            }
            None => Arc::clone(&inner.fallback),
        };
        ChannelStream::new(
            channel,
            Arc::clone(&inner.deliverer),
            Arc::clone(&inner.identity),
            seek_from,
            Arc::clone(&inner.handler),
        )
        .with_hooks(Arc::clone(&inner.hooks))
        .with_options(inner.options.clone())
    }

    /// Forward one channel into the merged output until either side closes.
    fn spawn_pump(
        &self,
        cancel: CancellationToken,
        mut blocks: mpsc::Receiver<H::Output>,
        out: mpsc::Sender<H::Output>,
    ) {
        self.inner.tracker.spawn(async move {
            loop {
                let item = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    item = blocks.recv() => match item {
                        Some(item) => item,
                        None => break,
                    },
                };
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    sent = out.send(item) => {
                        if sent.is_err() {
                            break;
                        }
                    }
                }
            }
        });
    }

    /// Names of the channels with a spawned stream.
    pub fn channels(&self) -> Vec<String> {
        self.inner
            .streams
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn stream(&self, channel: &str) -> Option<Arc<ChannelStream<H>>> {
        self.inner
            .streams
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(channel)
            .cloned()
    }

    /// Status of every spawned channel stream.
    pub fn statuses(&self) -> BTreeMap<String, StreamStatus> {
        self.inner
            .streams
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, s)| (name.clone(), s.status()))
            .collect()
    }

    /// Cancel the spawn loop, pumps and channel streams. Idempotent.
    pub fn stop(&self) {
        if let Some(token) = self.inner.cancel.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
            token.cancel();
        }
    }

    /// Wait for the spawn loop, the pumps, every channel stream, and the
    /// watcher when this stream started it, to exit.
    pub async fn closed(&self) {
        self.inner.tracker.close();
        self.inner.tracker.wait().await;
        if self.inner.owns_watcher.load(Ordering::SeqCst) {
            self.inner.watcher.closed().await;
        }
        let streams: Vec<_> = self
            .inner
            .streams
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for stream in streams {
            stream.closed().await;
        }
    }
}
