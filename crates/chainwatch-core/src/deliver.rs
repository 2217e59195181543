//! `BlocksDeliverer` trait — abstraction over a peer's deliver service.
//!
//! A deliverer opens one block stream for a signed seek request. The
//! streaming engine owns the returned [`Delivery`] and closes it on every
//! exit path.

use async_trait::async_trait;
use futures::Stream;
use std::fmt;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

use crate::error::DeliverError;
use crate::proto::Block;
use crate::seek::SeekRequest;

/// A stream of raw blocks from a single channel.
pub type BlockStream = Pin<Box<dyn Stream<Item = Result<Block, DeliverError>> + Send>>;

/// An open delivery: the block stream plus a release hook for the
/// underlying transport. The closer runs at most once, on `close()` or drop.
pub struct Delivery {
    pub blocks: BlockStream,
    closer: Option<Box<dyn FnOnce() + Send>>,
}

impl Delivery {
    pub fn new(blocks: BlockStream) -> Self {
        Self {
            blocks,
            closer: None,
        }
    }

    pub fn with_closer(mut self, closer: impl FnOnce() + Send + 'static) -> Self {
        self.closer = Some(Box::new(closer));
        self
    }

    /// Release the transport. Idempotent.
    pub fn close(&mut self) {
        if let Some(closer) = self.closer.take() {
            closer();
        }
    }
}

impl Drop for Delivery {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delivery")
            .field("open", &self.closer.is_some())
            .finish_non_exhaustive()
    }
}

/// Opens block delivery streams against a peer.
#[async_trait]
pub trait BlocksDeliverer: Send + Sync {
    /// Open a delivery for `request`. The stream must end (or stop producing)
    /// once `cancel` fires.
    async fn deliver(
        &self,
        cancel: CancellationToken,
        request: SeekRequest,
    ) -> Result<Delivery, DeliverError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn closer_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut delivery = Delivery::new(Box::pin(futures::stream::empty())).with_closer(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        delivery.close();
        delivery.close();
        drop(delivery);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_closes() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let delivery = Delivery::new(Box::pin(futures::stream::empty())).with_closer(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(delivery);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
