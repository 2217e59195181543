//! Start positions for channel streams.

use async_trait::async_trait;
use chainwatch_core::error::SeekError;
use chainwatch_core::PeerDiscovery;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

use crate::config::SeekFrom;

/// Computes the block number a channel stream starts from.
#[async_trait]
pub trait SeekFromFetcher: Send + Sync {
    async fn seek_from(&self, channel: &str) -> Result<u64, SeekError>;
}

/// Always the same block number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSeek(pub u64);

#[async_trait]
impl SeekFromFetcher for FixedSeek {
    async fn seek_from(&self, _channel: &str) -> Result<u64, SeekError> {
        Ok(self.0)
    }
}

/// The genesis block.
#[derive(Debug, Clone, Copy, Default)]
pub struct OldestSeek;

#[async_trait]
impl SeekFromFetcher for OldestSeek {
    async fn seek_from(&self, _channel: &str) -> Result<u64, SeekError> {
        Ok(0)
    }
}

/// The newest block at connect time, asked from peer discovery.
pub struct NewestSeek {
    discovery: Arc<dyn PeerDiscovery>,
}

impl NewestSeek {
    pub fn new(discovery: Arc<dyn PeerDiscovery>) -> Self {
        Self { discovery }
    }
}

#[async_trait]
impl SeekFromFetcher for NewestSeek {
    async fn seek_from(&self, channel: &str) -> Result<u64, SeekError> {
        let info = self.discovery.chain_info(channel).await?;
        info.height
            .checked_sub(1)
            .ok_or_else(|| SeekError::EmptyChannel {
                channel: channel.to_string(),
            })
    }
}

type SeekFn = dyn Fn(String) -> BoxFuture<'static, Result<u64, SeekError>> + Send + Sync;

/// User callback, e.g. a lookup of the last processed block in a database.
pub struct CallbackSeek {
    f: Arc<SeekFn>,
}

impl CallbackSeek {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<u64, SeekError>> + Send + 'static,
    {
        Self {
            f: Arc::new(move |channel| -> BoxFuture<'static, Result<u64, SeekError>> {
                Box::pin(f(channel))
            }),
        }
    }
}

#[async_trait]
impl SeekFromFetcher for CallbackSeek {
    async fn seek_from(&self, channel: &str) -> Result<u64, SeekError> {
        (self.f)(channel.to_string()).await
    }
}

/// Fetcher for a configured fallback position.
pub fn from_config(seek: SeekFrom, discovery: Arc<dyn PeerDiscovery>) -> Arc<dyn SeekFromFetcher> {
    match seek {
        SeekFrom::Oldest => Arc::new(OldestSeek),
        SeekFrom::Newest => Arc::new(NewestSeek::new(discovery)),
        SeekFrom::Fixed(n) => Arc::new(FixedSeek(n)),
    }
}

/// Fetcher for a per-channel override. The configured value names the block
/// to resume after, so delivery starts one block earlier.
pub fn from_override(value: u64) -> Arc<dyn SeekFromFetcher> {
    Arc::new(FixedSeek(value.saturating_sub(1)))
}
