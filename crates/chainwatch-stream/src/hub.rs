//! `FanoutHub` — broadcast one input to many subscriber lanes.
//!
//! Every item is offered to every lane before the next item is read, so all
//! subscribers see the same sequence. A slow lane slows the whole hub; a
//! lane's closer unblocks a broadcast waiting on it.

use chainwatch_core::error::ObserverError;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

const LANE_CAPACITY: usize = 1;

struct Lane<T> {
    tx: mpsc::Sender<T>,
    token: CancellationToken,
}

struct Registry<T> {
    lanes: BTreeMap<u64, Lane<T>>,
    stopped: bool,
}

struct HubInner<T> {
    registry: RwLock<Registry<T>>,
    next_id: AtomicU64,
    started: AtomicBool,
    tracker: TaskTracker,
}

/// Fan-out of one item stream to any number of subscribers.
pub struct FanoutHub<T> {
    inner: Arc<HubInner<T>>,
}

impl<T> Clone for FanoutHub<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Default for FanoutHub<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Removes and closes one subscriber lane. Idempotent.
pub struct LaneCloser<T> {
    id: u64,
    token: CancellationToken,
    hub: Weak<HubInner<T>>,
}

impl<T> LaneCloser<T> {
    pub async fn close(&self) {
        self.token.cancel();
        if let Some(hub) = self.hub.upgrade() {
            if hub.registry.write().await.lanes.remove(&self.id).is_some() {
                debug!(lane = self.id, "lane closed by subscriber");
            }
        }
    }
}

impl<T: Clone + Send + Sync + 'static> FanoutHub<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(HubInner {
                registry: RwLock::new(Registry {
                    lanes: BTreeMap::new(),
                    stopped: false,
                }),
                next_id: AtomicU64::new(0),
                started: AtomicBool::new(false),
                tracker: TaskTracker::new(),
            }),
        }
    }

    /// Register a lane. After the hub stopped, the returned receiver is
    /// already closed.
    pub async fn subscribe(&self) -> (mpsc::Receiver<T>, LaneCloser<T>) {
        let (tx, rx) = mpsc::channel(LANE_CAPACITY);
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();

        let mut registry = self.inner.registry.write().await;
        if !registry.stopped {
            registry.lanes.insert(
                id,
                Lane {
                    tx,
                    token: token.clone(),
                },
            );
        }
        drop(registry);

        let closer = LaneCloser {
            id,
            token,
            hub: Arc::downgrade(&self.inner),
        };
        (rx, closer)
    }

    pub async fn subscribers(&self) -> usize {
        self.inner.registry.read().await.lanes.len()
    }

    /// Start broadcasting `input`. Every lane closes once `parent` is
    /// cancelled or `input` ends.
    pub fn observe(
        &self,
        parent: &CancellationToken,
        input: mpsc::Receiver<T>,
    ) -> Result<(), ObserverError> {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return Err(ObserverError::AlreadyObserving { component: "fanout hub" });
        }
        let cancel = parent.child_token();
        let inner = Arc::clone(&self.inner);
        self.inner.tracker.spawn(broadcast(inner, cancel, input));
        Ok(())
    }

    /// Wait until the broadcast task has exited and every lane is closed.
    pub async fn closed(&self) {
        self.inner.tracker.close();
        self.inner.tracker.wait().await;
    }
}

async fn broadcast<T: Clone + Send + Sync + 'static>(
    inner: Arc<HubInner<T>>,
    cancel: CancellationToken,
    mut input: mpsc::Receiver<T>,
) {
    'items: loop {
        let item = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            item = input.recv() => match item {
                Some(item) => item,
                None => break,
            },
        };

        let mut dead = Vec::new();
        {
            let registry = inner.registry.read().await;
            for (&id, lane) in &registry.lanes {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break 'items,
                    _ = lane.token.cancelled() => dead.push(id),
                    sent = lane.tx.send(item.clone()) => {
                        if sent.is_err() {
                            dead.push(id);
                        }
                    }
                }
            }
        }

        if !dead.is_empty() {
            let mut registry = inner.registry.write().await;
            for id in dead {
                if registry.lanes.remove(&id).is_some() {
                    debug!(lane = id, "removed closed lane");
                }
            }
        }
    }

    let mut registry = inner.registry.write().await;
    registry.stopped = true;
    let lanes = std::mem::take(&mut registry.lanes);
    drop(registry);
    for lane in lanes.values() {
        lane.token.cancel();
    }
    info!(lanes = lanes.len(), "fanout hub stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn drain(rx: &mut mpsc::Receiver<u32>) -> Vec<u32> {
        let mut out = vec![];
        while let Some(v) = rx.recv().await {
            out.push(v);
        }
        out
    }

    #[tokio::test]
    async fn every_lane_sees_every_item_in_order() {
        let hub = FanoutHub::new();
        let (mut a, _ca) = hub.subscribe().await;
        let (mut b, _cb) = hub.subscribe().await;
        let (tx, rx) = mpsc::channel(1);
        hub.observe(&CancellationToken::new(), rx).unwrap();

        tokio::spawn(async move {
            for i in 0..10 {
                tx.send(i).await.unwrap();
            }
        });
        let (a, b) = tokio::join!(drain(&mut a), drain(&mut b));
        assert_eq!(a, (0..10).collect::<Vec<_>>());
        assert_eq!(a, b);
        hub.closed().await;
    }

    #[tokio::test]
    async fn closer_unblocks_stuck_broadcast() {
        let hub = FanoutHub::new();
        let (mut a, _ca) = hub.subscribe().await;
        let (_stuck, stuck_closer) = hub.subscribe().await;
        let (tx, rx) = mpsc::channel(1);
        hub.observe(&CancellationToken::new(), rx).unwrap();

        for i in 1..=3 {
            tx.send(i).await.unwrap();
        }
        assert_eq!(a.recv().await, Some(1));
        assert_eq!(a.recv().await, Some(2));
        // `stuck` never reads; item 2 waits on its full lane.
        assert!(tokio::time::timeout(Duration::from_millis(50), a.recv()).await.is_err());

        stuck_closer.close().await;
        stuck_closer.close().await;
        assert_eq!(a.recv().await, Some(3));
        assert_eq!(hub.subscribers().await, 1);
        drop(tx);
        assert_eq!(a.recv().await, None);
    }

    #[tokio::test]
    async fn dropped_receiver_is_removed() {
        let hub = FanoutHub::new();
        let (mut a, _ca) = hub.subscribe().await;
        let (b, _cb) = hub.subscribe().await;
        drop(b);
        let (tx, rx) = mpsc::channel(1);
        hub.observe(&CancellationToken::new(), rx).unwrap();
        tx.send(7).await.unwrap();
        assert_eq!(a.recv().await, Some(7));
        tx.send(8).await.unwrap();
        assert_eq!(a.recv().await, Some(8));
        assert_eq!(hub.subscribers().await, 1);
    }

    #[tokio::test]
    async fn cancellation_closes_lanes_and_late_subscribers() {
        let hub = FanoutHub::<u32>::new();
        let (mut a, _ca) = hub.subscribe().await;
        let (_tx, rx) = mpsc::channel(1);
        let root = CancellationToken::new();
        hub.observe(&root, rx).unwrap();
        assert!(matches!(
            hub.observe(&root, mpsc::channel(1).1),
            Err(ObserverError::AlreadyObserving { .. })
        ));

        root.cancel();
        assert_eq!(a.recv().await, None);
        hub.closed().await;

        let (mut late, closer) = hub.subscribe().await;
        assert_eq!(late.recv().await, None);
        closer.close().await;
    }
}
