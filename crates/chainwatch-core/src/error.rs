//! Error types for the ChainWatch observation pipeline.

use thiserror::Error;

/// Errors raised while decoding a block into a `BlockView`.
///
/// Every variant corresponds to a malformed mandatory byte stream, except
/// `ConfigBlock`, which reports an unusable configuration block passed in for
/// orderer signature extraction.
#[derive(Debug, Error, Clone)]
pub enum ParseError {
    #[error("failed to decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: prost::DecodeError,
    },

    #[error("failed to decode {what} of envelope {index}: {source}")]
    Envelope {
        index: usize,
        what: &'static str,
        #[source]
        source: prost::DecodeError,
    },

    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("transactions filter holds {flags} flags for {envelopes} envelopes")]
    FlagsMismatch { flags: usize, envelopes: usize },

    #[error("invalid config block: {reason}")]
    ConfigBlock { reason: String },
}

impl ParseError {
    /// Adapter for `map_err` on a `prost` decode of the named message.
    pub fn decode(what: &'static str) -> impl FnOnce(prost::DecodeError) -> Self {
        move |source| Self::Decode { what, source }
    }
}

/// Errors surfaced by a `BlocksDeliverer` (transport failures).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliverError {
    #[error("deliver connection failed for channel {channel}: {reason}")]
    ConnectionFailed { channel: String, reason: String },

    #[error("deliver service returned status {status} for channel {channel}")]
    Status { channel: String, status: i32 },

    #[error("deliver stream closed unexpectedly")]
    Closed,

    #[error("{0}")]
    Other(String),
}

/// Errors surfaced by `PeerDiscovery`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("list channels failed: {0}")]
    ListChannels(String),

    #[error("chain info for {channel} failed: {reason}")]
    ChainInfo { channel: String, reason: String },
}

/// Errors returned by seek-from fetchers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SeekError {
    #[error("seek-from lookup failed for {channel}: {reason}")]
    Lookup { channel: String, reason: String },

    #[error("channel {channel} has no blocks yet")]
    EmptyChannel { channel: String },

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}

/// Errors from the signing identity capability.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("signing failed: {0}")]
    Sign(String),
}

/// Errors reported by block transformers. Never fatal for the stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("transformer '{transformer}' failed: {reason}")]
    Failed { transformer: String, reason: String },

    #[error("transformer '{transformer}' panicked: {message}")]
    Panicked { transformer: String, message: String },
}

impl TransformError {
    pub fn failed(transformer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            transformer: transformer.into(),
            reason: reason.into(),
        }
    }

    /// Name of the transformer that produced this error.
    pub fn transformer(&self) -> &str {
        match self {
            Self::Failed { transformer, .. } | Self::Panicked { transformer, .. } => transformer,
        }
    }
}

/// Errors raised when building a channel matcher.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatcherError {
    #[error("invalid channel pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Why a channel stream is not (or no longer) delivering, as recorded in its
/// status.
#[derive(Debug, Error, Clone)]
pub enum StreamError {
    #[error("seek-from failed: {0}")]
    Seek(#[from] SeekError),

    #[error(transparent)]
    Deliver(#[from] DeliverError),

    #[error("seek request signing failed: {0}")]
    Identity(#[from] IdentityError),

    #[error("block {block:?} dropped: {source}")]
    Parse {
        block: Option<u64>,
        #[source]
        source: ParseError,
    },
}

/// Errors from the streaming components (watcher, streams, hub).
#[derive(Debug, Error)]
pub enum ObserverError {
    #[error("{component} is already observing")]
    AlreadyObserving { component: &'static str },

    #[error(transparent)]
    Matcher(#[from] MatcherError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("invalid configuration: {0}")]
    Config(String),
}
