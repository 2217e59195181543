//! Envelope decoding: headers, tx-id derivation, payload dispatch.

use chainwatch_core::error::ParseError;
use chainwatch_core::identity::compute_tx_id;
use chainwatch_core::model::{
    ChannelHeaderView, EnvelopePayload, EnvelopeView, HeaderType, Identity, SignatureHeaderView,
    ValidationCode,
};
use chainwatch_core::proto::msp::SerializedIdentity;
use chainwatch_core::proto::{ChannelHeader, Envelope, Payload, SignatureHeader};
use chrono::{DateTime, Utc};
use prost::Message;

use crate::config::parse_config_envelope;
use crate::transaction::parse_transaction;

/// Decode a marshalled `msp::SerializedIdentity`. Empty input yields an empty
/// identity.
pub(crate) fn decode_identity(bytes: &[u8]) -> Result<Identity, prost::DecodeError> {
    let id = SerializedIdentity::decode(bytes)?;
    Ok(Identity {
        msp_id: id.mspid,
        id_bytes: id.id_bytes,
    })
}

pub(crate) fn timestamp(ts: Option<&prost_types::Timestamp>) -> Option<DateTime<Utc>> {
    let ts = ts?;
    DateTime::from_timestamp(ts.seconds, u32::try_from(ts.nanos).ok()?)
}

/// Re-tag a decode failure with the envelope it happened in.
fn in_envelope(index: usize) -> impl Fn(ParseError) -> ParseError {
    move |err| match err {
        ParseError::Decode { what, source } => ParseError::Envelope { index, what, source },
        other => other,
    }
}

pub(crate) fn parse_envelope(
    index: usize,
    raw: &[u8],
    validation_code: ValidationCode,
) -> Result<EnvelopeView, ParseError> {
    decode_envelope(raw, validation_code).map_err(in_envelope(index))
}

fn decode_envelope(raw: &[u8], validation_code: ValidationCode) -> Result<EnvelopeView, ParseError> {
    let envelope = Envelope::decode(raw).map_err(ParseError::decode("envelope"))?;
    let payload =
        Payload::decode(envelope.payload.as_slice()).map_err(ParseError::decode("payload"))?;
    let header = payload
        .header
        .as_ref()
        .ok_or(ParseError::MissingField { field: "payload.header" })?;
    let channel_header = ChannelHeader::decode(header.channel_header.as_slice())
        .map_err(ParseError::decode("channel header"))?;
    let signature_header = SignatureHeader::decode(header.signature_header.as_slice())
        .map_err(ParseError::decode("signature header"))?;
    let creator = decode_identity(&signature_header.creator)
        .map_err(ParseError::decode("creator identity"))?;

    let tx_id = if channel_header.tx_id.is_empty() {
        compute_tx_id(&signature_header.nonce, &signature_header.creator)
    } else {
        channel_header.tx_id.clone()
    };

    let header_type = HeaderType::from_i32(channel_header.r#type);
    let body = match header_type {
        HeaderType::EndorserTransaction => {
            EnvelopePayload::EndorserTransaction(parse_transaction(&payload.data)?)
        }
        HeaderType::Config => EnvelopePayload::Config(Box::new(parse_config_envelope(&payload.data)?)),
        _ => EnvelopePayload::Raw {
            raw_unparsed: payload.data,
        },
    };

    Ok(EnvelopeView {
        channel_header: ChannelHeaderView {
            header_type,
            version: channel_header.version,
            channel_id: channel_header.channel_id,
            tx_id,
            timestamp: timestamp(channel_header.timestamp.as_ref()),
            epoch: channel_header.epoch,
        },
        signature_header: SignatureHeaderView {
            creator,
            nonce: signature_header.nonce,
        },
        signature: envelope.signature,
        validation_code,
        payload: body,
    })
}
