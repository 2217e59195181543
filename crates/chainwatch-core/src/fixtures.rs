//! Builders for well-formed wire blocks.
//!
//! Used by unit and integration tests across the workspace and by the
//! `chainwatch fixtures` command. Enabled with the `fixtures` feature.

use prost::Message;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};

use crate::model::HeaderType;
use crate::proto::common::{
    IdentifierHeader, LastConfig, Metadata, MetadataSignature, OrdererBlockMetadata,
};
use crate::proto::configtx::{
    policy_type, signature_policy, BlockDataHashingStructure, Capabilities, Capability, Config,
    ConfigEnvelope, ConfigGroup, ConfigPolicy, ConfigValue, Consortium, HashingAlgorithm,
    ImplicitMetaPolicy, OrdererAddresses, Policy, SignaturePolicy, SignaturePolicyEnvelope,
};
use crate::proto::msp::{FabricMspConfig, MspConfig, MspPrincipal, MspRole, SerializedIdentity};
use crate::proto::orderer::{
    BatchSize, BatchTimeout, BftConfigMetadata, BftConsenter, ConsensusType, RaftConfigMetadata,
    RaftConsenter,
};
use crate::proto::peer::{
    AnchorPeer, AnchorPeers, ChaincodeAction, ChaincodeActionPayload, ChaincodeEndorsedAction,
    ChaincodeEvent, ChaincodeId, ChaincodeInput, ChaincodeInvocationSpec,
    ChaincodeProposalPayload, ChaincodeSpec, Endorsement, ProposalResponsePayload, Response,
    Transaction, TransactionAction,
};
use crate::proto::rwset::{KvRead, KvRwSet, KvWrite, NsReadWriteSet, TxReadWriteSet, Version};
use crate::proto::{
    Block, BlockData, BlockHeader, BlockMetadata, BlockMetadataIndex, ChannelHeader, Envelope,
    Header, Payload, SignatureHeader,
};

/// Fixed header timestamp (2023-11-14T22:13:20Z) so fixtures are reproducible.
pub const FIXTURE_TIMESTAMP: i64 = 1_700_000_000;

/// Marshalled `msp::SerializedIdentity`.
pub fn serialized_identity(msp_id: &str, id_bytes: &[u8]) -> Vec<u8> {
    SerializedIdentity {
        mspid: msp_id.to_string(),
        id_bytes: id_bytes.to_vec(),
    }
    .encode_to_vec()
}

/// A PEM-looking certificate for `common_name`, good enough for display paths.
pub fn fake_certificate(common_name: &str) -> Vec<u8> {
    format!(
        "-----BEGIN CERTIFICATE-----\n{}\n-----END CERTIFICATE-----\n",
        hex::encode(common_name)
    )
    .into_bytes()
}

fn channel_header(channel: &str, header_type: HeaderType, tx_id: &str) -> Vec<u8> {
    ChannelHeader {
        r#type: header_type.as_i32(),
        version: 0,
        timestamp: Some(prost_types::Timestamp {
            seconds: FIXTURE_TIMESTAMP,
            nanos: 0,
        }),
        channel_id: channel.to_string(),
        tx_id: tx_id.to_string(),
        epoch: 0,
        extension: vec![],
        tls_cert_hash: vec![],
    }
    .encode_to_vec()
}

/// An envelope of arbitrary header type carrying `data` verbatim.
pub fn raw_envelope(channel: &str, header_type: HeaderType, data: &[u8]) -> Vec<u8> {
    let payload = Payload {
        header: Some(Header {
            channel_header: channel_header(channel, header_type, ""),
            signature_header: SignatureHeader::default().encode_to_vec(),
        }),
        data: data.to_vec(),
    };
    Envelope {
        payload: payload.encode_to_vec(),
        signature: vec![],
    }
    .encode_to_vec()
}

// ─── Endorser transactions ───────────────────────────────────────────────────

/// Builder for a single-action endorser transaction envelope.
#[derive(Debug, Clone)]
pub struct EndorserTx {
    channel: String,
    tx_id: String,
    creator: Vec<u8>,
    nonce: Vec<u8>,
    chaincode: String,
    version: String,
    args: Vec<Vec<u8>>,
    transient: HashMap<String, Vec<u8>>,
    reads: Vec<(String, String, Option<(u64, u64)>)>,
    writes: Vec<(String, String, Vec<u8>, bool)>,
    event: Option<(String, Vec<u8>)>,
    endorsers: Vec<Vec<u8>>,
}

impl EndorserTx {
    pub fn new(channel: &str, chaincode: &str) -> Self {
        Self {
            channel: channel.to_string(),
            tx_id: String::new(),
            creator: serialized_identity("Org1MSP", &fake_certificate("User1@org1")),
            nonce: b"fixture-nonce".to_vec(),
            chaincode: chaincode.to_string(),
            version: "1.0".to_string(),
            args: vec![],
            transient: HashMap::new(),
            reads: vec![],
            writes: vec![],
            event: None,
            endorsers: vec![serialized_identity("Org1MSP", &fake_certificate("peer0.org1"))],
        }
    }

    /// Explicit tx id; left empty the parser derives it from nonce and creator.
    pub fn tx_id(mut self, tx_id: &str) -> Self {
        self.tx_id = tx_id.to_string();
        self
    }

    pub fn creator(mut self, creator: Vec<u8>) -> Self {
        self.creator = creator;
        self
    }

    pub fn nonce(mut self, nonce: &[u8]) -> Self {
        self.nonce = nonce.to_vec();
        self
    }

    pub fn arg(mut self, arg: impl AsRef<[u8]>) -> Self {
        self.args.push(arg.as_ref().to_vec());
        self
    }

    pub fn transient(mut self, key: &str, value: &[u8]) -> Self {
        self.transient.insert(key.to_string(), value.to_vec());
        self
    }

    pub fn read(mut self, namespace: &str, key: &str, version: Option<(u64, u64)>) -> Self {
        self.reads
            .push((namespace.to_string(), key.to_string(), version));
        self
    }

    pub fn write(mut self, namespace: &str, key: &str, value: impl AsRef<[u8]>) -> Self {
        self.writes.push((
            namespace.to_string(),
            key.to_string(),
            value.as_ref().to_vec(),
            false,
        ));
        self
    }

    pub fn delete(mut self, namespace: &str, key: &str) -> Self {
        self.writes
            .push((namespace.to_string(), key.to_string(), vec![], true));
        self
    }

    pub fn event(mut self, name: &str, payload: &[u8]) -> Self {
        self.event = Some((name.to_string(), payload.to_vec()));
        self
    }

    fn rwset(&self) -> TxReadWriteSet {
        let mut by_ns: BTreeMap<&str, KvRwSet> = BTreeMap::new();
        for (ns, key, version) in &self.reads {
            by_ns.entry(ns.as_str()).or_default().reads.push(KvRead {
                key: key.clone(),
                version: version.map(|(block_num, tx_num)| Version { block_num, tx_num }),
            });
        }
        for (ns, key, value, is_delete) in &self.writes {
            by_ns.entry(ns.as_str()).or_default().writes.push(KvWrite {
                key: key.clone(),
                is_delete: *is_delete,
                value: value.clone(),
            });
        }
        TxReadWriteSet {
            data_model: 0,
            ns_rwset: by_ns
                .into_iter()
                .map(|(ns, kv)| NsReadWriteSet {
                    namespace: ns.to_string(),
                    rwset: kv.encode_to_vec(),
                    collection_hashed_rwset: vec![],
                })
                .collect(),
        }
    }

    /// Marshalled `common::Envelope`.
    pub fn envelope(&self) -> Vec<u8> {
        let chaincode_id = ChaincodeId {
            path: String::new(),
            name: self.chaincode.clone(),
            version: self.version.clone(),
        };

        let proposal_payload = ChaincodeProposalPayload {
            input: ChaincodeInvocationSpec {
                chaincode_spec: Some(ChaincodeSpec {
                    r#type: 1,
                    chaincode_id: Some(chaincode_id.clone()),
                    input: Some(ChaincodeInput {
                        args: self.args.clone(),
                        decorations: HashMap::new(),
                        is_init: false,
                    }),
                    timeout: 0,
                }),
            }
            .encode_to_vec(),
            transient_map: self.transient.clone(),
        }
        .encode_to_vec();

        let events = self
            .event
            .as_ref()
            .map(|(name, payload)| {
                ChaincodeEvent {
                    chaincode_id: self.chaincode.clone(),
                    tx_id: self.tx_id.clone(),
                    event_name: name.clone(),
                    payload: payload.clone(),
                }
                .encode_to_vec()
            })
            .unwrap_or_default();

        let action = ChaincodeAction {
            results: self.rwset().encode_to_vec(),
            events,
            response: Some(Response {
                status: 200,
                message: String::new(),
                payload: vec![],
            }),
            chaincode_id: Some(chaincode_id),
        };

        let response_payload = ProposalResponsePayload {
            proposal_hash: Sha256::digest(&proposal_payload).to_vec(),
            extension: action.encode_to_vec(),
        }
        .encode_to_vec();

        let endorsed = ChaincodeEndorsedAction {
            proposal_response_payload: response_payload,
            endorsements: self
                .endorsers
                .iter()
                .map(|endorser| Endorsement {
                    endorser: endorser.clone(),
                    signature: b"endorsement-signature".to_vec(),
                })
                .collect(),
        };

        let signature_header = SignatureHeader {
            creator: self.creator.clone(),
            nonce: self.nonce.clone(),
        }
        .encode_to_vec();

        let tx = Transaction {
            actions: vec![TransactionAction {
                header: signature_header.clone(),
                payload: ChaincodeActionPayload {
                    chaincode_proposal_payload: proposal_payload,
                    action: Some(endorsed),
                }
                .encode_to_vec(),
            }],
        };

        let payload = Payload {
            header: Some(Header {
                channel_header: channel_header(
                    &self.channel,
                    HeaderType::EndorserTransaction,
                    &self.tx_id,
                ),
                signature_header,
            }),
            data: tx.encode_to_vec(),
        };
        Envelope {
            payload: payload.encode_to_vec(),
            signature: b"creator-signature".to_vec(),
        }
        .encode_to_vec()
    }
}

// ─── Blocks ──────────────────────────────────────────────────────────────────

/// Builder for a `common::Block` with metadata slots filled on demand.
#[derive(Debug, Clone, Default)]
pub struct BlockBuilder {
    number: u64,
    previous_hash: Vec<u8>,
    envelopes: Vec<Vec<u8>>,
    flags: Option<Vec<u8>>,
    signatures: Vec<MetadataSignature>,
    last_config: Option<u64>,
}

impl BlockBuilder {
    pub fn new(number: u64) -> Self {
        Self {
            number,
            ..Default::default()
        }
    }

    pub fn previous_hash(mut self, hash: &[u8]) -> Self {
        self.previous_hash = hash.to_vec();
        self
    }

    pub fn envelope(mut self, envelope: Vec<u8>) -> Self {
        self.envelopes.push(envelope);
        self
    }

    /// Transactions filter, one validation code per envelope.
    pub fn flags(mut self, flags: &[u8]) -> Self {
        self.flags = Some(flags.to_vec());
        self
    }

    /// A CFT orderer signature carrying a full signature header.
    pub fn orderer_signature(mut self, creator: Vec<u8>, signature: &[u8]) -> Self {
        self.signatures.push(MetadataSignature {
            signature_header: SignatureHeader {
                creator,
                nonce: b"orderer-nonce".to_vec(),
            }
            .encode_to_vec(),
            signature: signature.to_vec(),
            identifier_header: vec![],
        });
        self
    }

    /// A BFT orderer signature referencing consenter `identifier`.
    pub fn bft_signature(mut self, identifier: u32, signature: &[u8]) -> Self {
        self.signatures.push(MetadataSignature {
            signature_header: vec![],
            signature: signature.to_vec(),
            identifier_header: IdentifierHeader {
                identifier,
                nonce: b"bft-nonce".to_vec(),
            }
            .encode_to_vec(),
        });
        self
    }

    pub fn last_config(mut self, index: u64) -> Self {
        self.last_config = Some(index);
        self
    }

    pub fn build(self) -> Block {
        let mut metadata = vec![Vec::new(); BlockMetadataIndex::CommitHash as usize + 1];

        if !self.signatures.is_empty() || self.last_config.is_some() {
            metadata[BlockMetadataIndex::Signatures as usize] = Metadata {
                value: OrdererBlockMetadata {
                    last_config: self.last_config.map(|index| LastConfig { index }),
                    consenter_metadata: vec![],
                }
                .encode_to_vec(),
                signatures: self.signatures,
            }
            .encode_to_vec();
        }
        if let Some(flags) = self.flags {
            metadata[BlockMetadataIndex::TransactionsFilter as usize] = flags;
        }

        let mut hasher = Sha256::new();
        for env in &self.envelopes {
            hasher.update(env);
        }

        Block {
            header: Some(BlockHeader {
                number: self.number,
                previous_hash: self.previous_hash,
                data_hash: hasher.finalize().to_vec(),
            }),
            data: Some(BlockData {
                data: self.envelopes,
            }),
            metadata: Some(BlockMetadata { metadata }),
        }
    }
}

/// Block `number` holding `txs` endorser transactions on `channel`.
pub fn endorser_block(channel: &str, number: u64, txs: usize) -> Block {
    (0..txs)
        .fold(BlockBuilder::new(number), |b, i| {
            b.envelope(
                EndorserTx::new(channel, "basic")
                    .nonce(format!("{channel}-{number}-{i}").as_bytes())
                    .arg("CreateAsset")
                    .arg(format!("asset{number}-{i}"))
                    .write("basic", &format!("asset{number}-{i}"), b"{\"owner\":\"tom\"}")
                    .envelope(),
            )
        })
        .flags(&vec![0; txs])
        .build()
}

/// Blocks `0..len` of a channel, one endorser transaction each.
pub fn endorser_chain(channel: &str, len: u64) -> Vec<Block> {
    (0..len).map(|n| endorser_block(channel, n, 1)).collect()
}

// ─── Channel configuration ───────────────────────────────────────────────────

/// One BFT consenter of a config fixture.
#[derive(Debug, Clone)]
pub struct ConsenterFixture {
    pub id: u64,
    pub host: String,
    pub port: u32,
    pub msp_id: String,
    /// Marshalled `SerializedIdentity`; may be garbage to exercise failures.
    pub identity: Vec<u8>,
}

impl ConsenterFixture {
    pub fn new(id: u64, msp_id: &str) -> Self {
        Self {
            id,
            host: format!("orderer{id}.example.com"),
            port: 7050,
            msp_id: msp_id.to_string(),
            identity: serialized_identity(msp_id, &fake_certificate(&format!("orderer{id}"))),
        }
    }
}

/// Builder for a channel configuration envelope.
#[derive(Debug, Clone)]
pub struct ConfigFixture {
    channel: String,
    sequence: u64,
    application_orgs: Vec<(String, Vec<(String, i32)>)>,
    orderer_orgs: Vec<(String, Vec<String>)>,
    consensus_type: String,
    consensus_metadata: Option<Vec<u8>>,
    bft_consenters: Vec<ConsenterFixture>,
    raft_consenters: Vec<(String, u32)>,
}

impl ConfigFixture {
    pub fn new(channel: &str) -> Self {
        Self {
            channel: channel.to_string(),
            sequence: 1,
            application_orgs: vec![],
            orderer_orgs: vec![],
            consensus_type: "etcdraft".to_string(),
            consensus_metadata: None,
            bft_consenters: vec![],
            raft_consenters: vec![],
        }
    }

    pub fn sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn application_org(mut self, msp_id: &str, anchor_peers: &[(&str, i32)]) -> Self {
        self.application_orgs.push((
            msp_id.to_string(),
            anchor_peers
                .iter()
                .map(|(h, p)| (h.to_string(), *p))
                .collect(),
        ));
        self
    }

    pub fn orderer_org(mut self, msp_id: &str, endpoints: &[&str]) -> Self {
        self.orderer_orgs.push((
            msp_id.to_string(),
            endpoints.iter().map(|e| e.to_string()).collect(),
        ));
        self
    }

    /// Switch to a `BFT` orderer with the given consenters.
    pub fn bft(mut self, consenters: Vec<ConsenterFixture>) -> Self {
        self.consensus_type = "BFT".to_string();
        self.bft_consenters = consenters;
        self
    }

    pub fn raft(mut self, consenters: &[(&str, u32)]) -> Self {
        self.consensus_type = "etcdraft".to_string();
        self.raft_consenters = consenters.iter().map(|(h, p)| (h.to_string(), *p)).collect();
        self
    }

    /// Override the consensus type and its raw metadata bytes.
    pub fn consensus(mut self, consensus_type: &str, metadata: &[u8]) -> Self {
        self.consensus_type = consensus_type.to_string();
        self.consensus_metadata = Some(metadata.to_vec());
        self
    }

    fn consensus_metadata(&self) -> Vec<u8> {
        if let Some(raw) = &self.consensus_metadata {
            return raw.clone();
        }
        if !self.bft_consenters.is_empty() {
            return BftConfigMetadata {
                consenters: self
                    .bft_consenters
                    .iter()
                    .map(|c| BftConsenter {
                        consenter_id: c.id,
                        host: c.host.clone(),
                        port: c.port,
                        msp_id: c.msp_id.clone(),
                        client_tls_cert: vec![],
                        server_tls_cert: vec![],
                        identity: c.identity.clone(),
                    })
                    .collect(),
            }
            .encode_to_vec();
        }
        RaftConfigMetadata {
            consenters: self
                .raft_consenters
                .iter()
                .map(|(host, port)| RaftConsenter {
                    host: host.clone(),
                    port: *port,
                    client_tls_cert: vec![],
                    server_tls_cert: vec![],
                })
                .collect(),
        }
        .encode_to_vec()
    }

    fn channel_group(&self) -> ConfigGroup {
        let mut application = ConfigGroup {
            values: values([("Capabilities", capabilities(&["V2_5"]))]),
            policies: standard_policies(),
            mod_policy: "Admins".into(),
            ..Default::default()
        };
        for (msp_id, anchors) in &self.application_orgs {
            let mut org = msp_group(msp_id);
            org.values.insert(
                "AnchorPeers".into(),
                value(
                    AnchorPeers {
                        anchor_peers: anchors
                            .iter()
                            .map(|(host, port)| AnchorPeer {
                                host: host.clone(),
                                port: *port,
                            })
                            .collect(),
                    }
                    .encode_to_vec(),
                ),
            );
            org.policies
                .insert("Endorsement".into(), signed_by_member(msp_id));
            application.groups.insert(msp_id.clone(), org);
        }

        let mut orderer = ConfigGroup {
            values: values([
                (
                    "BatchSize",
                    BatchSize {
                        max_message_count: 10,
                        absolute_max_bytes: 103_809_024,
                        preferred_max_bytes: 524_288,
                    }
                    .encode_to_vec(),
                ),
                (
                    "BatchTimeout",
                    BatchTimeout {
                        timeout: "2s".into(),
                    }
                    .encode_to_vec(),
                ),
                (
                    "ConsensusType",
                    ConsensusType {
                        r#type: self.consensus_type.clone(),
                        metadata: self.consensus_metadata(),
                        state: 0,
                    }
                    .encode_to_vec(),
                ),
                ("Capabilities", capabilities(&["V2_0"])),
            ]),
            policies: standard_policies(),
            mod_policy: "Admins".into(),
            ..Default::default()
        };
        for (msp_id, endpoints) in &self.orderer_orgs {
            let mut org = msp_group(msp_id);
            org.values.insert(
                "Endpoints".into(),
                value(
                    OrdererAddresses {
                        addresses: endpoints.clone(),
                    }
                    .encode_to_vec(),
                ),
            );
            orderer.groups.insert(msp_id.clone(), org);
        }

        ConfigGroup {
            version: 0,
            groups: HashMap::from([
                ("Application".to_string(), application),
                ("Orderer".to_string(), orderer),
            ]),
            values: values([
                (
                    "HashingAlgorithm",
                    HashingAlgorithm {
                        name: "SHA256".into(),
                    }
                    .encode_to_vec(),
                ),
                (
                    "BlockDataHashingStructure",
                    BlockDataHashingStructure { width: u32::MAX }.encode_to_vec(),
                ),
                (
                    "OrdererAddresses",
                    OrdererAddresses {
                        addresses: vec!["orderer.example.com:7050".into()],
                    }
                    .encode_to_vec(),
                ),
                (
                    "Consortium",
                    Consortium {
                        name: "SampleConsortium".into(),
                    }
                    .encode_to_vec(),
                ),
                ("Capabilities", capabilities(&["V2_0"])),
            ]),
            policies: standard_policies(),
            mod_policy: "Admins".into(),
        }
    }

    /// Marshalled CONFIG envelope.
    pub fn envelope(&self) -> Vec<u8> {
        let config = ConfigEnvelope {
            config: Some(Config {
                sequence: self.sequence,
                channel_group: Some(self.channel_group()),
            }),
            last_update: None,
        };
        raw_envelope(&self.channel, HeaderType::Config, &config.encode_to_vec())
    }

    /// A config block at `number`, pointing its last-config index at itself.
    pub fn block(&self, number: u64) -> Block {
        BlockBuilder::new(number)
            .envelope(self.envelope())
            .last_config(number)
            .build()
    }
}

fn value(bytes: Vec<u8>) -> ConfigValue {
    ConfigValue {
        version: 0,
        value: bytes,
        mod_policy: "Admins".into(),
    }
}

fn values<const N: usize>(entries: [(&str, Vec<u8>); N]) -> HashMap<String, ConfigValue> {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), value(v)))
        .collect()
}

fn capabilities(names: &[&str]) -> Vec<u8> {
    Capabilities {
        capabilities: names
            .iter()
            .map(|n| (n.to_string(), Capability {}))
            .collect(),
    }
    .encode_to_vec()
}

fn policy(r#type: i32, value: Vec<u8>) -> ConfigPolicy {
    ConfigPolicy {
        version: 0,
        policy: Some(Policy { r#type, value }),
        mod_policy: "Admins".into(),
    }
}

fn implicit_meta(sub_policy: &str, rule: i32) -> ConfigPolicy {
    policy(
        policy_type::IMPLICIT_META,
        ImplicitMetaPolicy {
            sub_policy: sub_policy.into(),
            rule,
        }
        .encode_to_vec(),
    )
}

fn standard_policies() -> HashMap<String, ConfigPolicy> {
    HashMap::from([
        ("Readers".to_string(), implicit_meta("Readers", 0)),
        ("Writers".to_string(), implicit_meta("Writers", 0)),
        ("Admins".to_string(), implicit_meta("Admins", 2)),
    ])
}

fn signed_by_member(msp_id: &str) -> ConfigPolicy {
    policy(
        policy_type::SIGNATURE,
        SignaturePolicyEnvelope {
            version: 0,
            rule: Some(SignaturePolicy {
                r#type: Some(signature_policy::Type::SignedBy(0)),
            }),
            identities: vec![MspPrincipal {
                principal_classification: 0,
                principal: MspRole {
                    msp_identifier: msp_id.into(),
                    role: 3,
                }
                .encode_to_vec(),
            }],
        }
        .encode_to_vec(),
    )
}

fn msp_group(msp_id: &str) -> ConfigGroup {
    let msp = MspConfig {
        r#type: 0,
        config: FabricMspConfig {
            name: msp_id.to_string(),
            root_certs: vec![fake_certificate(&format!("ca.{msp_id}"))],
            intermediate_certs: vec![],
            admins: vec![],
            revocation_list: vec![],
            organizational_unit_identifiers: vec![],
            tls_root_certs: vec![fake_certificate(&format!("tlsca.{msp_id}"))],
            tls_intermediate_certs: vec![],
        }
        .encode_to_vec(),
    };
    ConfigGroup {
        values: values([("MSP", msp.encode_to_vec())]),
        policies: HashMap::from([
            ("Readers".to_string(), signed_by_member(msp_id)),
            ("Admins".to_string(), signed_by_member(msp_id)),
        ]),
        mod_policy: "Admins".into(),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_builder_fills_metadata_slots() {
        let block = BlockBuilder::new(3)
            .envelope(raw_envelope("c", HeaderType::Message, b"x"))
            .flags(&[0])
            .orderer_signature(serialized_identity("OrdererMSP", b"cert"), b"sig")
            .build();
        assert_eq!(block.number(), Some(3));
        assert_eq!(block.envelopes().len(), 1);
        let md = block.metadata.as_ref();
        assert!(BlockMetadataIndex::Signatures.get(md).is_some());
        assert_eq!(BlockMetadataIndex::TransactionsFilter.get(md), Some(&[0u8][..]));
        assert!(BlockMetadataIndex::LastConfig.get(md).is_none());
    }

    #[test]
    fn endorser_block_has_one_flag_per_tx() {
        let block = endorser_block("mychannel", 9, 3);
        assert_eq!(block.envelopes().len(), 3);
        assert_eq!(
            BlockMetadataIndex::TransactionsFilter.get(block.metadata.as_ref()),
            Some(&[0u8, 0, 0][..])
        );
    }
}
