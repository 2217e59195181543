//! In-memory peer: discovery and block delivery over ledgers held in memory.
//!
//! Used by the test suites and by `chainwatch replay`. Failure injection
//! helpers exercise the reconnect paths of the streaming engine.

use async_trait::async_trait;
use chainwatch_core::error::{DeliverError, DiscoveryError, IdentityError};
use chainwatch_core::proto::msp::SerializedIdentity;
use chainwatch_core::proto::Block;
use chainwatch_core::{BlocksDeliverer, ChainInfo, Delivery, PeerDiscovery, SeekRequest, SigningIdentity};
use prost::Message;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
struct Ledger {
    blocks: Vec<Block>,
    /// Listed by discovery.
    visible: bool,
}

#[derive(Debug, Default)]
struct Faults {
    discovery: usize,
    deliveries: HashMap<String, usize>,
    /// channel → blocks to deliver before the next stream fails.
    break_after: HashMap<String, usize>,
}

#[derive(Debug)]
struct MemoryInner {
    ledgers: RwLock<BTreeMap<String, Ledger>>,
    appended: Notify,
    follow: bool,
    faults: Mutex<Faults>,
    requests: Mutex<Vec<SeekRequest>>,
    open: AtomicUsize,
    opened: AtomicUsize,
}

/// A peer whose ledgers live in memory. Clones share state.
#[derive(Clone, Debug)]
pub struct MemoryPeer {
    inner: Arc<MemoryInner>,
}

impl Default for MemoryPeer {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPeer {
    /// A peer whose deliveries wait for new blocks, like a live deliver service.
    pub fn new() -> Self {
        Self::build(true)
    }

    /// A peer whose deliveries end after the last stored block.
    pub fn finite() -> Self {
        Self::build(false)
    }

    fn build(follow: bool) -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                ledgers: RwLock::new(BTreeMap::new()),
                appended: Notify::new(),
                follow,
                faults: Mutex::new(Faults::default()),
                requests: Mutex::new(Vec::new()),
                open: AtomicUsize::new(0),
                opened: AtomicUsize::new(0),
            }),
        }
    }

    fn ledgers_mut(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, Ledger>> {
        self.inner.ledgers.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn faults(&self) -> std::sync::MutexGuard<'_, Faults> {
        self.inner.faults.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Join a channel (no-op when already joined). The channel becomes visible.
    pub fn add_channel(&self, channel: &str) {
        self.ledgers_mut().entry(channel.to_string()).or_default().visible = true;
    }

    /// Stop listing `channel` in discovery. Its ledger stays deliverable.
    pub fn hide_channel(&self, channel: &str) {
        if let Some(ledger) = self.ledgers_mut().get_mut(channel) {
            ledger.visible = false;
        }
    }

    /// Append a block, joining the channel if needed, and wake waiting
    /// deliveries. A hidden channel stays hidden.
    pub fn push_block(&self, channel: &str, block: Block) {
        self.push_blocks(channel, [block]);
    }

    pub fn push_blocks(&self, channel: &str, blocks: impl IntoIterator<Item = Block>) {
        {
            let mut ledgers = self.ledgers_mut();
            let ledger = ledgers.entry(channel.to_string()).or_insert_with(|| Ledger {
                blocks: Vec::new(),
                visible: true,
            });
            ledger.blocks.extend(blocks);
        }
        self.inner.appended.notify_waiters();
    }

    pub fn height(&self, channel: &str) -> u64 {
        self.inner
            .ledgers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(channel)
            .map_or(0, |l| l.blocks.len() as u64)
    }

    /// Fail the next `n` discovery calls.
    pub fn fail_next_discovery(&self, n: usize) {
        self.faults().discovery = n;
    }

    /// Refuse the next `n` deliveries for `channel`.
    pub fn fail_next_deliveries(&self, channel: &str, n: usize) {
        self.faults().deliveries.insert(channel.to_string(), n);
    }

    /// The next delivery for `channel` yields a transport error after
    /// `blocks` blocks.
    pub fn break_next_delivery_after(&self, channel: &str, blocks: usize) {
        self.faults().break_after.insert(channel.to_string(), blocks);
    }

    /// Every seek request received, in arrival order.
    pub fn requests(&self) -> Vec<SeekRequest> {
        self.inner.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Deliveries not yet closed.
    pub fn open_deliveries(&self) -> usize {
        self.inner.open.load(Ordering::SeqCst)
    }

    /// Deliveries opened so far.
    pub fn deliveries_opened(&self) -> usize {
        self.inner.opened.load(Ordering::SeqCst)
    }

    fn take_fault(counter: &mut usize) -> bool {
        if *counter > 0 {
            *counter -= 1;
            true
        } else {
            false
        }
    }

    fn block_at(&self, channel: &str, index: usize) -> Option<Block> {
        self.inner
            .ledgers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(channel)?
            .blocks
            .get(index)
            .cloned()
    }
}

#[async_trait]
impl PeerDiscovery for MemoryPeer {
    async fn list_channels(&self) -> Result<Vec<String>, DiscoveryError> {
        if Self::take_fault(&mut self.faults().discovery) {
            return Err(DiscoveryError::ListChannels("injected failure".into()));
        }
        Ok(self
            .inner
            .ledgers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, l)| l.visible)
            .map(|(name, _)| name.clone())
            .collect())
    }

    /// `current_hash` and `previous_hash` are taken from the newest block header.
    async fn chain_info(&self, channel: &str) -> Result<ChainInfo, DiscoveryError> {
        let ledgers = self.inner.ledgers.read().unwrap_or_else(PoisonError::into_inner);
        let ledger = ledgers.get(channel).ok_or_else(|| DiscoveryError::ChainInfo {
            channel: channel.to_string(),
            reason: "channel not joined".into(),
        })?;
        let header = ledger.blocks.last().and_then(|b| b.header.clone()).unwrap_or_default();
        Ok(ChainInfo {
            height: ledger.blocks.len() as u64,
            current_hash: header.data_hash,
            previous_hash: header.previous_hash,
        })
    }
}

struct Cursor {
    peer: MemoryPeer,
    channel: String,
    next: usize,
    stop: u64,
    break_after: Option<usize>,
    cancel: CancellationToken,
}

#[async_trait]
impl BlocksDeliverer for MemoryPeer {
    async fn deliver(
        &self,
        cancel: CancellationToken,
        request: SeekRequest,
    ) -> Result<Delivery, DeliverError> {
        self.inner
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let break_after = {
            let mut faults = self.faults();
            if let Some(n) = faults.deliveries.get_mut(&request.channel) {
                if Self::take_fault(n) {
                    return Err(DeliverError::ConnectionFailed {
                        channel: request.channel,
                        reason: "injected failure".into(),
                    });
                }
            }
            faults.break_after.remove(&request.channel)
        };

        let next = {
            let ledgers = self.inner.ledgers.read().unwrap_or_else(PoisonError::into_inner);
            let ledger = ledgers.get(&request.channel).ok_or_else(|| DeliverError::Status {
                channel: request.channel.clone(),
                status: 404,
            })?;
            ledger
                .blocks
                .partition_point(|b| b.number().unwrap_or(0) < request.start)
        };

        let cursor = Cursor {
            peer: self.clone(),
            channel: request.channel.clone(),
            next,
            stop: request.stop_number(),
            break_after,
            cancel,
        };
        let blocks = futures::stream::unfold(cursor, |mut c| async move {
            loop {
                if c.break_after == Some(0) {
                    c.break_after = None;
                    return Some((Err(DeliverError::Closed), c));
                }
                let inner = c.peer.inner.clone();
                let appended = inner.appended.notified();
                tokio::pin!(appended);
                appended.as_mut().enable();

                if let Some(block) = c.peer.block_at(&c.channel, c.next) {
                    if block.number().unwrap_or(0) > c.stop {
                        return None;
                    }
                    c.next += 1;
                    if let Some(n) = c.break_after.as_mut() {
                        *n -= 1;
                    }
                    return Some((Ok(block), c));
                }
                if !inner.follow || c.cancel.is_cancelled() {
                    return None;
                }
                tokio::select! {
                    _ = c.cancel.cancelled() => return None,
                    _ = &mut appended => {}
                }
            }
        });

        self.inner.open.fetch_add(1, Ordering::SeqCst);
        self.inner.opened.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.clone();
        Ok(Delivery::new(Box::pin(blocks)).with_closer(move || {
            inner.open.fetch_sub(1, Ordering::SeqCst);
        }))
    }
}

/// A client identity that produces empty signatures. Suitable for peers
/// that do not verify seek requests, such as [`MemoryPeer`].
#[derive(Debug, Clone)]
pub struct UnsignedIdentity {
    msp_id: String,
    name: String,
}

impl UnsignedIdentity {
    pub fn new(msp_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            msp_id: msp_id.into(),
            name: name.into(),
        }
    }
}

impl SigningIdentity for UnsignedIdentity {
    fn sign(&self, _message: &[u8]) -> Result<Vec<u8>, IdentityError> {
        Ok(Vec::new())
    }

    fn serialize(&self) -> Vec<u8> {
        SerializedIdentity {
            mspid: self.msp_id.clone(),
            id_bytes: self.name.as_bytes().to_vec(),
        }
        .encode_to_vec()
    }

    fn identifier(&self) -> String {
        format!("{}@{}", self.name, self.msp_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainwatch_core::fixtures::endorser_chain;
    use futures::StreamExt;
    use std::time::Duration;

    fn request(channel: &str, start: u64, stop: Option<u64>) -> SeekRequest {
        SeekRequest::new(channel, start, stop, &UnsignedIdentity::new("Org1MSP", "client")).unwrap()
    }

    #[tokio::test]
    async fn finite_delivery_ends_after_last_block() {
        let peer = MemoryPeer::finite();
        peer.push_blocks("c", endorser_chain("c", 5));
        let mut d = peer.deliver(CancellationToken::new(), request("c", 2, None)).await.unwrap();
        let mut numbers = vec![];
        while let Some(b) = d.blocks.next().await {
            numbers.push(b.unwrap().number().unwrap());
        }
        assert_eq!(numbers, vec![2, 3, 4]);
        assert_eq!(peer.open_deliveries(), 1);
        d.close();
        assert_eq!(peer.open_deliveries(), 0);
    }

    #[tokio::test]
    async fn stop_bounds_delivery() {
        let peer = MemoryPeer::new();
        peer.push_blocks("c", endorser_chain("c", 5));
        let mut d = peer.deliver(CancellationToken::new(), request("c", 1, Some(2))).await.unwrap();
        let n: Vec<_> = d.blocks.by_ref().map(|b| b.unwrap().number().unwrap()).collect().await;
        assert_eq!(n, vec![1, 2]);
    }

    #[tokio::test]
    async fn following_delivery_wakes_on_append() {
        let peer = MemoryPeer::new();
        peer.add_channel("c");
        let cancel = CancellationToken::new();
        let mut d = peer.deliver(cancel.clone(), request("c", 0, None)).await.unwrap();

        let writer = peer.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            writer.push_blocks("c", endorser_chain("c", 1));
        });
        let first = tokio::time::timeout(Duration::from_secs(2), d.blocks.next()).await.unwrap();
        assert_eq!(first.unwrap().unwrap().number(), Some(0));

        cancel.cancel();
        assert!(d.blocks.next().await.is_none());
    }

    #[tokio::test]
    async fn injected_faults() {
        let peer = MemoryPeer::finite();
        peer.push_blocks("c", endorser_chain("c", 3));
        peer.fail_next_deliveries("c", 1);
        assert!(peer.deliver(CancellationToken::new(), request("c", 0, None)).await.is_err());

        peer.break_next_delivery_after("c", 1);
        let mut d = peer.deliver(CancellationToken::new(), request("c", 0, None)).await.unwrap();
        let items: Vec<_> = d.blocks.by_ref().collect().await;
        assert!(items[0].is_ok());
        assert_eq!(items[1], Err(DeliverError::Closed));
        assert_eq!(peer.requests().len(), 2);

        assert!(matches!(
            peer.deliver(CancellationToken::new(), request("missing", 0, None)).await,
            Err(DeliverError::Status { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn hidden_channel_is_not_listed() {
        let peer = MemoryPeer::new();
        peer.add_channel("a");
        peer.add_channel("b");
        peer.hide_channel("b");
        assert_eq!(peer.list_channels().await.unwrap(), vec!["a".to_string()]);
        assert_eq!(peer.chain_info("b").await.unwrap().height, 0);
    }
}
