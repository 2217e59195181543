//! `PeerChannelWatcher` — periodically lists the peer's channels.

use chainwatch_core::error::{DiscoveryError, ObserverError};
use chainwatch_core::{ChannelInfo, PeerDiscovery};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::config::ObserverConfig;
use crate::matcher::ChannelMatcher;

/// Keeps a snapshot of the matching channels a peer has joined.
///
/// Cloning is cheap; clones share the snapshot and the observe loop.
#[derive(Clone)]
pub struct PeerChannelWatcher {
    inner: Arc<WatcherInner>,
}

struct WatcherInner {
    discovery: Arc<dyn PeerDiscovery>,
    matcher: ChannelMatcher,
    period: Duration,
    channels: RwLock<BTreeMap<String, ChannelInfo>>,
    last_error: RwLock<Option<DiscoveryError>>,
    refreshing: tokio::sync::Mutex<()>,
    cancel: Mutex<Option<CancellationToken>>,
    tracker: TaskTracker,
}

impl PeerChannelWatcher {
    pub fn new(discovery: Arc<dyn PeerDiscovery>, matcher: ChannelMatcher, period: Duration) -> Self {
        Self {
            inner: Arc::new(WatcherInner {
                discovery,
                matcher,
                period: period.max(Duration::from_millis(1)),
                channels: RwLock::new(BTreeMap::new()),
                last_error: RwLock::new(None),
                refreshing: tokio::sync::Mutex::new(()),
                cancel: Mutex::new(None),
                tracker: TaskTracker::new(),
            }),
        }
    }

    pub fn from_config(
        discovery: Arc<dyn PeerDiscovery>,
        config: &ObserverConfig,
    ) -> Result<Self, ObserverError> {
        let matcher = ChannelMatcher::new(&config.channels_to_match)?;
        Ok(Self::new(discovery, matcher, config.peer_channel_observe_period()))
    }

    pub fn discovery(&self) -> Arc<dyn PeerDiscovery> {
        self.inner.discovery.clone()
    }

    /// Refresh once, then keep refreshing every period until `parent` is
    /// cancelled or [`stop`](Self::stop) is called. Returns after the first
    /// refresh; a second call does nothing and returns `false`.
    pub async fn observe(&self, parent: &CancellationToken) -> bool {
        let cancel = {
            let mut slot = self.inner.cancel.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.is_some() {
                debug!("channel watcher already observing");
                return false;
            }
            let token = parent.child_token();
            *slot = Some(token.clone());
            token
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return true,
            _ = self.refresh() => {}
        }

        let watcher = self.clone();
        self.inner.tracker.spawn(async move {
            let mut ticker = tokio::time::interval_at(
                tokio::time::Instant::now() + watcher.inner.period,
                watcher.inner.period,
            );
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = watcher.refresh() => {}
                }
            }
            debug!("channel watcher stopped");
        });
        true
    }

    /// List channels and their heights now. On failure the previous snapshot
    /// is kept and the error is recorded as [`last_error`](Self::last_error).
    pub async fn refresh(&self) -> Result<(), DiscoveryError> {
        let _guard = self.inner.refreshing.lock().await;
        match self.fetch().await {
            Ok(channels) => {
                let mut map = self.inner.channels.write().unwrap_or_else(PoisonError::into_inner);
                for name in channels.keys().filter(|n| !map.contains_key(*n)) {
                    info!(channel = %name, "discovered channel");
                }
                *map = channels;
                drop(map);
                *self.inner.last_error.write().unwrap_or_else(PoisonError::into_inner) = None;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "channel discovery failed; keeping previous snapshot");
                *self.inner.last_error.write().unwrap_or_else(PoisonError::into_inner) = Some(e.clone());
                Err(e)
            }
        }
    }

    async fn fetch(&self) -> Result<BTreeMap<String, ChannelInfo>, DiscoveryError> {
        let names = self.inner.discovery.list_channels().await?;
        let mut channels = BTreeMap::new();
        for matched in self.inner.matcher.filter(names.iter().map(String::as_str)) {
            let info = self.inner.discovery.chain_info(&matched.name).await?;
            channels.insert(
                matched.name.clone(),
                ChannelInfo {
                    channel_name: matched.name,
                    height: info.height,
                    updated_at: Utc::now(),
                },
            );
        }
        Ok(channels)
    }

    /// Copy of the current snapshot.
    pub fn channels(&self) -> BTreeMap<String, ChannelInfo> {
        self.inner.channels.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn channel_names(&self) -> Vec<String> {
        self.inner
            .channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Error of the most recent refresh, cleared by the next successful one.
    pub fn last_error(&self) -> Option<DiscoveryError> {
        self.inner.last_error.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_observing(&self) -> bool {
        self.inner
            .cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|t| !t.is_cancelled())
    }

    /// Stop the observe loop. Idempotent.
    pub fn stop(&self) {
        if let Some(token) = self.inner.cancel.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
            token.cancel();
        }
    }

    /// Wait until the observe loop has exited.
    pub async fn closed(&self) {
        self.inner.tracker.close();
        self.inner.tracker.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChannelRule;
    use crate::memory::MemoryPeer;

    fn watcher(peer: &MemoryPeer, rules: &[ChannelRule]) -> PeerChannelWatcher {
        PeerChannelWatcher::new(
            Arc::new(peer.clone()),
            ChannelMatcher::new(rules).unwrap(),
            Duration::from_millis(20),
        )
    }

    #[tokio::test]
    async fn observe_populates_before_returning() {
        let peer = MemoryPeer::new();
        peer.add_channel("sample-channel");
        peer.add_channel("fabcar-channel");
        let w = watcher(&peer, &[ChannelRule::pattern("sample")]);

        let root = CancellationToken::new();
        assert!(w.observe(&root).await);
        assert_eq!(w.channel_names(), vec!["sample-channel".to_string()]);
        assert!(w.is_observing());

        // Second call is a no-op.
        assert!(!w.observe(&root).await);

        root.cancel();
        w.closed().await;
        assert!(!w.is_observing());
    }

    #[tokio::test]
    async fn failure_keeps_snapshot_and_records_error() {
        let peer = MemoryPeer::new();
        peer.add_channel("a");
        let w = watcher(&peer, &[]);
        w.refresh().await.unwrap();

        peer.add_channel("b");
        peer.fail_next_discovery(1);
        assert!(w.refresh().await.is_err());
        assert_eq!(w.channel_names(), vec!["a".to_string()]);
        assert!(matches!(w.last_error(), Some(DiscoveryError::ListChannels(_))));

        w.refresh().await.unwrap();
        assert_eq!(w.channel_names().len(), 2);
        assert!(w.last_error().is_none());
    }

    #[tokio::test]
    async fn loop_picks_up_new_channels() {
        let peer = MemoryPeer::new();
        peer.add_channel("a");
        let w = watcher(&peer, &[]);
        let root = CancellationToken::new();
        w.observe(&root).await;

        peer.add_channel("b");
        tokio::time::timeout(Duration::from_secs(2), async {
            while w.channel_names().len() < 2 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        w.stop();
        w.stop();
        w.closed().await;
    }

    #[tokio::test]
    async fn heights_are_reported() {
        let peer = MemoryPeer::new();
        peer.add_channel("a");
        peer.push_blocks("a", chainwatch_core::fixtures::endorser_chain("a", 3));
        let w = watcher(&peer, &[]);
        w.refresh().await.unwrap();
        assert_eq!(w.channels()["a"].height, 3);
    }
}
