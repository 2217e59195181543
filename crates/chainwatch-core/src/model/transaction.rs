//! Endorser transaction views: actions, proposals, read-write sets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Identity;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionView {
    pub actions: Vec<TransactionActionView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionActionView {
    pub creator: Identity,
    #[serde(with = "crate::hex_bytes")]
    pub nonce: Vec<u8>,
    pub proposal: ChaincodeProposalView,
    pub endorsed_action: ChaincodeEndorsedActionView,
    /// Marshalled proposal response payload, preserved verbatim.
    #[serde(with = "crate::hex_bytes")]
    pub proposal_response_payload: Vec<u8>,
}

/// Chaincode coordinates `{name, version, path}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChaincodeRef {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChaincodeProposalView {
    pub chaincode: ChaincodeRef,
    /// By convention `args[0]` is the function name.
    #[serde(with = "crate::hex_bytes::list")]
    pub args: Vec<Vec<u8>>,
    pub is_init: bool,
    /// Opaque, unordered, never hashed into state.
    #[serde(with = "crate::hex_bytes::map")]
    pub transient_map: BTreeMap<String, Vec<u8>>,
    /// JSON renderings of `args[1..]`, set by an action-payload transformer.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub decoded_args: Option<Vec<serde_json::Value>>,
}

impl ChaincodeProposalView {
    /// `args[0]` as UTF-8, the invoked function name.
    pub fn function(&self) -> Option<String> {
        self.args
            .first()
            .map(|f| String::from_utf8_lossy(f).into_owned())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChaincodeEndorsedActionView {
    pub chaincode: ChaincodeRef,
    #[serde(with = "crate::hex_bytes")]
    pub proposal_hash: Vec<u8>,
    pub read_write_sets: Vec<NsReadWriteSetView>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub event: Option<ChaincodeEventView>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub response: Option<ResponseView>,
    pub endorsements: Vec<EndorsementView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeEventView {
    pub chaincode_id: String,
    pub tx_id: String,
    pub event_name: String,
    #[serde(with = "crate::hex_bytes")]
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseView {
    pub status: i32,
    pub message: String,
    #[serde(with = "crate::hex_bytes")]
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndorsementView {
    pub endorser: Identity,
    #[serde(with = "crate::hex_bytes")]
    pub signature: Vec<u8>,
}

/// Reads and writes of one namespace (chaincode) within a transaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NsReadWriteSetView {
    pub namespace: String,
    pub reads: Vec<KvReadView>,
    pub writes: Vec<KvWriteView>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub range_queries: Vec<RangeQueryView>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub metadata_writes: Vec<KvMetadataWriteView>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub collection_hashed: Vec<CollectionHashedView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvVersion {
    pub block_num: u64,
    pub tx_num: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvReadView {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub version: Option<KvVersion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KvWriteView {
    pub key: String,
    #[serde(with = "crate::hex_bytes")]
    pub value: Vec<u8>,
    pub is_delete: bool,
    /// JSON rendering of `value`, set by a value transformer.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub decoded: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeQueryView {
    pub start_key: String,
    pub end_key: String,
    pub itr_exhausted: bool,
    pub reads: Vec<KvReadView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvMetadataWriteView {
    pub key: String,
    #[serde(with = "crate::hex_bytes::map")]
    pub entries: BTreeMap<String, Vec<u8>>,
}

/// Hashed reads/writes of one private data collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionHashedView {
    pub collection_name: String,
    pub hashed_reads: Vec<KvReadHashView>,
    pub hashed_writes: Vec<KvWriteHashView>,
    #[serde(with = "crate::hex_bytes")]
    pub pvt_rwset_hash: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvReadHashView {
    #[serde(with = "crate::hex_bytes")]
    pub key_hash: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub version: Option<KvVersion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvWriteHashView {
    #[serde(with = "crate::hex_bytes")]
    pub key_hash: Vec<u8>,
    pub is_delete: bool,
    #[serde(with = "crate::hex_bytes")]
    pub value_hash: Vec<u8>,
    pub is_purge: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_is_first_arg() {
        let p = ChaincodeProposalView {
            args: vec![b"transfer".to_vec(), b"alice".to_vec()],
            ..Default::default()
        };
        assert_eq!(p.function().as_deref(), Some("transfer"));
        assert_eq!(ChaincodeProposalView::default().function(), None);
    }
}
