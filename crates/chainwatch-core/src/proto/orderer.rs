//! `orderer` package: deliver seek requests, batching, and consensus metadata.

#[derive(Clone, PartialEq, prost::Message)]
pub struct SeekInfo {
    #[prost(message, optional, tag = "1")]
    pub start: Option<SeekPosition>,
    #[prost(message, optional, tag = "2")]
    pub stop: Option<SeekPosition>,
    /// BLOCK_UNTIL_READY = 0, FAIL_IF_NOT_READY = 1.
    #[prost(int32, tag = "3")]
    pub behavior: i32,
    /// STRICT = 0, BEST_EFFORT = 1.
    #[prost(int32, tag = "4")]
    pub error_response: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SeekPosition {
    #[prost(oneof = "seek_position::Type", tags = "1, 2, 3")]
    pub r#type: Option<seek_position::Type>,
}

pub mod seek_position {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Type {
        #[prost(message, tag = "1")]
        Newest(super::SeekNewest),
        #[prost(message, tag = "2")]
        Oldest(super::SeekOldest),
        #[prost(message, tag = "3")]
        Specified(super::SeekSpecified),
    }
}

#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct SeekNewest {}

#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct SeekOldest {}

#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct SeekSpecified {
    #[prost(uint64, tag = "1")]
    pub number: u64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BatchSize {
    #[prost(uint32, tag = "1")]
    pub max_message_count: u32,
    #[prost(uint32, tag = "2")]
    pub absolute_max_bytes: u32,
    #[prost(uint32, tag = "3")]
    pub preferred_max_bytes: u32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BatchTimeout {
    /// Go duration string, e.g. `"2s"`.
    #[prost(string, tag = "1")]
    pub timeout: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ConsensusType {
    #[prost(string, tag = "1")]
    pub r#type: String,
    #[prost(bytes = "vec", tag = "2")]
    pub metadata: Vec<u8>,
    /// STATE_NORMAL = 0, STATE_MAINTENANCE = 1.
    #[prost(int32, tag = "3")]
    pub state: i32,
}

/// Consensus metadata of the byzantine-fault-tolerant orderer type.
#[derive(Clone, PartialEq, prost::Message)]
pub struct BftConfigMetadata {
    #[prost(message, repeated, tag = "1")]
    pub consenters: Vec<BftConsenter>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BftConsenter {
    #[prost(uint64, tag = "1")]
    pub consenter_id: u64,
    #[prost(string, tag = "2")]
    pub host: String,
    #[prost(uint32, tag = "3")]
    pub port: u32,
    #[prost(string, tag = "4")]
    pub msp_id: String,
    #[prost(bytes = "vec", tag = "5")]
    pub client_tls_cert: Vec<u8>,
    #[prost(bytes = "vec", tag = "6")]
    pub server_tls_cert: Vec<u8>,
    /// Marshalled `msp::SerializedIdentity` of the consenter.
    #[prost(bytes = "vec", tag = "7")]
    pub identity: Vec<u8>,
}

/// Consensus metadata of the `etcdraft` orderer type.
#[derive(Clone, PartialEq, prost::Message)]
pub struct RaftConfigMetadata {
    #[prost(message, repeated, tag = "1")]
    pub consenters: Vec<RaftConsenter>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RaftConsenter {
    #[prost(string, tag = "1")]
    pub host: String,
    #[prost(uint32, tag = "2")]
    pub port: u32,
    #[prost(bytes = "vec", tag = "3")]
    pub client_tls_cert: Vec<u8>,
    #[prost(bytes = "vec", tag = "4")]
    pub server_tls_cert: Vec<u8>,
}
