//! Signed seek requests sent to the deliver service.
//!
//! A seek request is an envelope of type `DELIVER_SEEK_INFO` whose payload
//! carries an `orderer::SeekInfo` for the block range `[start, stop]`. It is
//! signed by the client's [`SigningIdentity`].

use chrono::Utc;
use prost::Message;
use rand::RngCore;

use crate::error::IdentityError;
use crate::identity::{compute_tx_id, SigningIdentity};
use crate::model::HeaderType;
use crate::proto::orderer::{seek_position, SeekInfo, SeekPosition, SeekSpecified};
use crate::proto::{ChannelHeader, Envelope, Header, Payload, SignatureHeader};

const NONCE_LEN: usize = 24;

/// Behaviour of the deliver service when the requested block is not yet
/// available: wait for it.
pub const BLOCK_UNTIL_READY: i32 = 0;

/// A block range request for one channel, with its signed envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct SeekRequest {
    pub channel: String,
    pub start: u64,
    /// `None` follows the channel forever.
    pub stop: Option<u64>,
    pub envelope: Envelope,
}

impl SeekRequest {
    /// Build and sign a seek request.
    pub fn new(
        channel: impl Into<String>,
        start: u64,
        stop: Option<u64>,
        identity: &dyn SigningIdentity,
    ) -> Result<Self, IdentityError> {
        let channel = channel.into();
        let envelope = seek_envelope(&channel, start, stop, identity)?;
        Ok(Self {
            channel,
            start,
            stop,
            envelope,
        })
    }

    /// Last block number the deliver service is asked for.
    pub fn stop_number(&self) -> u64 {
        self.stop.unwrap_or(u64::MAX)
    }
}

fn specified(number: u64) -> SeekPosition {
    SeekPosition {
        r#type: Some(seek_position::Type::Specified(SeekSpecified { number })),
    }
}

fn seek_envelope(
    channel: &str,
    start: u64,
    stop: Option<u64>,
    identity: &dyn SigningIdentity,
) -> Result<Envelope, IdentityError> {
    let mut nonce = vec![0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);
    let creator = identity.serialize();

    let now = Utc::now();
    let channel_header = ChannelHeader {
        r#type: HeaderType::DeliverSeekInfo.as_i32(),
        version: 0,
        timestamp: Some(prost_types::Timestamp {
            seconds: now.timestamp(),
            nanos: now.timestamp_subsec_nanos() as i32,
        }),
        channel_id: channel.to_string(),
        tx_id: compute_tx_id(&nonce, &creator),
        epoch: 0,
        extension: vec![],
        tls_cert_hash: vec![],
    };
    let signature_header = SignatureHeader { creator, nonce };

    let seek_info = SeekInfo {
        start: Some(specified(start)),
        stop: Some(specified(stop.unwrap_or(u64::MAX))),
        behavior: BLOCK_UNTIL_READY,
        error_response: 0,
    };

    let payload = Payload {
        header: Some(Header {
            channel_header: channel_header.encode_to_vec(),
            signature_header: signature_header.encode_to_vec(),
        }),
        data: seek_info.encode_to_vec(),
    }
    .encode_to_vec();

    let signature = identity.sign(&payload)?;
    Ok(Envelope { payload, signature })
}
