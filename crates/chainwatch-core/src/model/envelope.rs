//! Envelope-level views: headers, identities, validation codes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ChannelConfigView, TransactionView};

/// Channel header type tag. Total over `i32`: unknown tags map to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderType {
    Message,
    Config,
    ConfigUpdate,
    EndorserTransaction,
    OrdererTransaction,
    DeliverSeekInfo,
    ChaincodePackage,
    Other(i32),
}

impl HeaderType {
    pub fn from_i32(value: i32) -> Self {
        match value {
            0 => Self::Message,
            1 => Self::Config,
            2 => Self::ConfigUpdate,
            3 => Self::EndorserTransaction,
            4 => Self::OrdererTransaction,
            5 => Self::DeliverSeekInfo,
            6 => Self::ChaincodePackage,
            other => Self::Other(other),
        }
    }

    pub fn as_i32(self) -> i32 {
        match self {
            Self::Message => 0,
            Self::Config => 1,
            Self::ConfigUpdate => 2,
            Self::EndorserTransaction => 3,
            Self::OrdererTransaction => 4,
            Self::DeliverSeekInfo => 5,
            Self::ChaincodePackage => 6,
            Self::Other(v) => v,
        }
    }
}

impl fmt::Display for HeaderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message => write!(f, "MESSAGE"),
            Self::Config => write!(f, "CONFIG"),
            Self::ConfigUpdate => write!(f, "CONFIG_UPDATE"),
            Self::EndorserTransaction => write!(f, "ENDORSER_TRANSACTION"),
            Self::OrdererTransaction => write!(f, "ORDERER_TRANSACTION"),
            Self::DeliverSeekInfo => write!(f, "DELIVER_SEEK_INFO"),
            Self::ChaincodePackage => write!(f, "CHAINCODE_PACKAGE"),
            Self::Other(v) => write!(f, "UNKNOWN({v})"),
        }
    }
}

/// Per-envelope validation code from the block's transactions filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationCode(pub u8);

impl ValidationCode {
    pub const VALID: Self = Self(0);

    pub fn is_valid(self) -> bool {
        self == Self::VALID
    }

    /// Platform name of the code, e.g. `MVCC_READ_CONFLICT`.
    pub fn name(self) -> &'static str {
        match self.0 {
            0 => "VALID",
            1 => "NIL_ENVELOPE",
            2 => "BAD_PAYLOAD",
            3 => "BAD_COMMON_HEADER",
            4 => "BAD_CREATOR_SIGNATURE",
            5 => "INVALID_ENDORSER_TRANSACTION",
            6 => "INVALID_CONFIG_TRANSACTION",
            7 => "UNSUPPORTED_TX_PAYLOAD",
            8 => "BAD_PROPOSAL_TXID",
            9 => "DUPLICATE_TXID",
            10 => "ENDORSEMENT_POLICY_FAILURE",
            11 => "MVCC_READ_CONFLICT",
            12 => "PHANTOM_READ_CONFLICT",
            13 => "UNKNOWN_TX_TYPE",
            14 => "TARGET_CHAIN_NOT_FOUND",
            15 => "MARSHAL_TX_ERROR",
            16 => "NIL_TXACTION",
            17 => "EXPIRED_CHAINCODE",
            18 => "CHAINCODE_VERSION_CONFLICT",
            19 => "BAD_HEADER_EXTENSION",
            20 => "BAD_CHANNEL_HEADER",
            21 => "BAD_RESPONSE_PAYLOAD",
            22 => "BAD_RWSET",
            23 => "ILLEGAL_WRITESET",
            24 => "INVALID_WRITESET",
            25 => "INVALID_CHAINCODE",
            254 => "NOT_VALIDATED",
            255 => "INVALID_OTHER_REASON",
            _ => "UNKNOWN",
        }
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.0)
    }
}

/// A deserialized creator / signer identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub msp_id: String,
    /// Certificate bytes (PEM for X.509 identities).
    #[serde(with = "crate::hex_bytes")]
    pub id_bytes: Vec<u8>,
}

impl Identity {
    pub fn is_empty(&self) -> bool {
        self.msp_id.is_empty() && self.id_bytes.is_empty()
    }

    /// The certificate as PEM text, when the identity carries one.
    pub fn certificate_pem(&self) -> Option<&str> {
        std::str::from_utf8(&self.id_bytes)
            .ok()
            .filter(|s| s.trim_start().starts_with("-----BEGIN"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelHeaderView {
    pub header_type: HeaderType,
    pub version: i32,
    pub channel_id: String,
    pub tx_id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub timestamp: Option<DateTime<Utc>>,
    pub epoch: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureHeaderView {
    pub creator: Identity,
    #[serde(with = "crate::hex_bytes")]
    pub nonce: Vec<u8>,
}

/// Payload of an envelope, discriminated by the channel header type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnvelopePayload {
    EndorserTransaction(TransactionView),
    Config(Box<ChannelConfigView>),
    /// Any other header type: payload data kept verbatim.
    Raw {
        #[serde(with = "crate::hex_bytes")]
        raw_unparsed: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeView {
    pub channel_header: ChannelHeaderView,
    pub signature_header: SignatureHeaderView,
    #[serde(with = "crate::hex_bytes")]
    pub signature: Vec<u8>,
    pub validation_code: ValidationCode,
    pub payload: EnvelopePayload,
}

impl EnvelopeView {
    pub fn tx_id(&self) -> &str {
        &self.channel_header.tx_id
    }

    pub fn header_type(&self) -> HeaderType {
        self.channel_header.header_type
    }

    pub fn is_valid(&self) -> bool {
        self.validation_code.is_valid()
    }

    pub fn transaction(&self) -> Option<&TransactionView> {
        match &self.payload {
            EnvelopePayload::EndorserTransaction(tx) => Some(tx),
            _ => None,
        }
    }

    pub fn transaction_mut(&mut self) -> Option<&mut TransactionView> {
        match &mut self.payload {
            EnvelopePayload::EndorserTransaction(tx) => Some(tx),
            _ => None,
        }
    }

    pub fn config(&self) -> Option<&ChannelConfigView> {
        match &self.payload {
            EnvelopePayload::Config(cfg) => Some(cfg),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_type_is_total() {
        for v in -2..10 {
            assert_eq!(HeaderType::from_i32(v).as_i32(), v);
        }
        assert_eq!(HeaderType::from_i32(3), HeaderType::EndorserTransaction);
        assert_eq!(HeaderType::from_i32(42), HeaderType::Other(42));
    }

    #[test]
    fn validation_code_names() {
        assert!(ValidationCode::VALID.is_valid());
        assert_eq!(ValidationCode(11).name(), "MVCC_READ_CONFLICT");
        assert_eq!(ValidationCode(100).name(), "UNKNOWN");
        assert_eq!(ValidationCode(10).to_string(), "ENDORSEMENT_POLICY_FAILURE(10)");
    }

    #[test]
    fn certificate_pem_requires_pem_header() {
        let id = Identity {
            msp_id: "Org1MSP".into(),
            id_bytes: b"-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n".to_vec(),
        };
        assert!(id.certificate_pem().is_some());
        let raw = Identity {
            msp_id: "Org1MSP".into(),
            id_bytes: vec![0xff, 0x00],
        };
        assert!(raw.certificate_pem().is_none());
        assert!(Identity::default().is_empty());
    }
}
