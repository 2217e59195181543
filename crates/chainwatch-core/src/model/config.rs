//! Channel configuration view decoded from a CONFIG envelope.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Identity;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfigView {
    pub sequence: u64,
    /// Application organisations keyed by group name.
    pub applications: BTreeMap<String, ApplicationOrgView>,
    /// Orderer organisations keyed by group name.
    pub orderers: BTreeMap<String, OrdererOrgView>,
    /// Channel-level orderer addresses (legacy, pre per-org endpoints).
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub orderer_addresses: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub batch_size: Option<BatchSizeView>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub batch_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub consensus: Option<ConsensusView>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub consortium: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hashing_algorithm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub block_data_hashing_width: Option<u32>,
    pub capabilities: CapabilitiesView,
    /// Policies keyed by group path, e.g. `Channel/Application/Writers`.
    pub policies: BTreeMap<String, PolicyView>,
}

impl ChannelConfigView {
    /// Consenters of a BFT orderer, empty for any other consensus type.
    pub fn bft_consenters(&self) -> &[ConsenterView] {
        match &self.consensus {
            Some(c) if c.is_bft() => &c.consenters,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MspView {
    pub name: String,
    #[serde(with = "crate::hex_bytes::list")]
    pub root_certs: Vec<Vec<u8>>,
    #[serde(with = "crate::hex_bytes::list")]
    pub intermediate_certs: Vec<Vec<u8>>,
    #[serde(with = "crate::hex_bytes::list")]
    pub admins: Vec<Vec<u8>>,
    #[serde(with = "crate::hex_bytes::list")]
    pub tls_root_certs: Vec<Vec<u8>>,
    #[serde(with = "crate::hex_bytes::list")]
    pub tls_intermediate_certs: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostPort {
    pub host: String,
    pub port: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationOrgView {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub msp: Option<MspView>,
    pub anchor_peers: Vec<HostPort>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrdererOrgView {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub msp: Option<MspView>,
    pub endpoints: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSizeView {
    pub max_messages: u32,
    pub absolute_max_bytes: u32,
    pub preferred_max_bytes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusView {
    /// `etcdraft`, `BFT`, `solo`, …
    pub consensus_type: String,
    pub state: i32,
    /// Undecoded consensus metadata, kept for every type.
    #[serde(with = "crate::hex_bytes")]
    pub metadata: Vec<u8>,
    pub consenters: Vec<ConsenterView>,
}

impl ConsensusView {
    pub fn is_bft(&self) -> bool {
        is_bft_type(&self.consensus_type)
    }
}

/// Whether a `ConsensusType.type` names a byzantine-fault-tolerant orderer.
pub fn is_bft_type(consensus_type: &str) -> bool {
    consensus_type.eq_ignore_ascii_case("bft") || consensus_type.eq_ignore_ascii_case("smartbft")
}

/// An orderer node taking part in consensus. `id` and `identity` are only
/// known for BFT orderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsenterView {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<u64>,
    pub host: String,
    pub port: u32,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub msp_id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub identity: Option<Identity>,
    #[serde(with = "crate::hex_bytes")]
    pub client_tls_cert: Vec<u8>,
    #[serde(with = "crate::hex_bytes")]
    pub server_tls_cert: Vec<u8>,
}

/// Capability names enabled at each level of the config tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitiesView {
    pub channel: Vec<String>,
    pub orderer: Vec<String>,
    pub application: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PolicyView {
    ImplicitMeta {
        sub_policy: String,
        rule: ImplicitMetaRule,
    },
    Signature {
        version: i32,
        rule: SignatureRule,
        identities: Vec<PrincipalView>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImplicitMetaRule {
    Any,
    All,
    Majority,
}

impl ImplicitMetaRule {
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Any),
            1 => Some(Self::All),
            2 => Some(Self::Majority),
            _ => None,
        }
    }
}

/// Signature policy tree: a leaf signed-by index into the identities list,
/// or an n-out-of combination of sub-rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureRule {
    SignedBy(i32),
    NOutOf { n: i32, rules: Vec<SignatureRule> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "classification", rename_all = "snake_case")]
pub enum PrincipalView {
    Role { msp_id: String, role: String },
    /// Principal kinds not decoded further.
    Other {
        code: i32,
        #[serde(with = "crate::hex_bytes")]
        principal: Vec<u8>,
    },
}

/// Display name of an `MSPRole.role` value.
pub fn msp_role_name(role: i32) -> String {
    match role {
        0 => "member".into(),
        1 => "admin".into(),
        2 => "client".into(),
        3 => "peer".into(),
        4 => "orderer".into(),
        other => format!("role({other})"),
    }
}
