//! Channel configuration decoding.
//!
//! Only the config envelope and its `Config` are mandatory. Every value
//! inside the config tree is decoded on a best-effort basis: a value that
//! fails to decode is left out of the view and logged at `debug`.

use std::collections::{BTreeMap, HashMap};

use chainwatch_core::error::ParseError;
use chainwatch_core::model::{
    is_bft_type, msp_role_name, ApplicationOrgView, BatchSizeView, CapabilitiesView,
    ChannelConfigView, ConsensusView, ConsenterView, HostPort, ImplicitMetaRule, MspView,
    OrdererOrgView, PolicyView, PrincipalView, SignatureRule,
};
use chainwatch_core::proto::configtx::{
    policy_type, signature_policy, BlockDataHashingStructure, Capabilities, ConfigEnvelope,
    ConfigGroup, ConfigValue, Consortium, HashingAlgorithm, ImplicitMetaPolicy, OrdererAddresses,
    Policy, SignaturePolicy, SignaturePolicyEnvelope,
};
use chainwatch_core::proto::msp::{FabricMspConfig, MspConfig, MspRole};
use chainwatch_core::proto::orderer::{
    BatchSize, BatchTimeout, BftConfigMetadata, ConsensusType, RaftConfigMetadata,
};
use chainwatch_core::proto::peer::AnchorPeers;
use prost::Message;
use tracing::debug;

use crate::envelope::decode_identity;

pub const APPLICATION_GROUP: &str = "Application";
pub const ORDERER_GROUP: &str = "Orderer";
const ROOT_GROUP: &str = "Channel";

const MSP_FABRIC: i32 = 0;
const PRINCIPAL_ROLE: i32 = 0;

/// Decode the data of a CONFIG envelope into a [`ChannelConfigView`].
pub fn parse_config_envelope(data: &[u8]) -> Result<ChannelConfigView, ParseError> {
    let envelope = ConfigEnvelope::decode(data).map_err(ParseError::decode("config envelope"))?;
    let config = envelope.config.ok_or(ParseError::MissingField {
        field: "config_envelope.config",
    })?;
    let root = config.channel_group.unwrap_or_default();

    let application = root.groups.get(APPLICATION_GROUP);
    let orderer = root.groups.get(ORDERER_GROUP);

    let mut policies = BTreeMap::new();
    collect_policies(ROOT_GROUP, &root, &mut policies);

    Ok(ChannelConfigView {
        sequence: config.sequence,
        applications: application
            .map(|g| {
                g.groups
                    .iter()
                    .map(|(name, org)| (name.clone(), application_org(org)))
                    .collect()
            })
            .unwrap_or_default(),
        orderers: orderer
            .map(|g| {
                g.groups
                    .iter()
                    .map(|(name, org)| (name.clone(), orderer_org(org)))
                    .collect()
            })
            .unwrap_or_default(),
        orderer_addresses: value::<OrdererAddresses>(&root.values, "OrdererAddresses")
            .map(|a| a.addresses)
            .unwrap_or_default(),
        batch_size: orderer
            .and_then(|g| value::<BatchSize>(&g.values, "BatchSize"))
            .map(|b| BatchSizeView {
                max_messages: b.max_message_count,
                absolute_max_bytes: b.absolute_max_bytes,
                preferred_max_bytes: b.preferred_max_bytes,
            }),
        batch_timeout: orderer
            .and_then(|g| value::<BatchTimeout>(&g.values, "BatchTimeout"))
            .map(|t| t.timeout),
        consensus: orderer
            .and_then(|g| value::<ConsensusType>(&g.values, "ConsensusType"))
            .map(consensus),
        consortium: value::<Consortium>(&root.values, "Consortium").map(|c| c.name),
        hashing_algorithm: value::<HashingAlgorithm>(&root.values, "HashingAlgorithm")
            .map(|h| h.name),
        block_data_hashing_width: value::<BlockDataHashingStructure>(
            &root.values,
            "BlockDataHashingStructure",
        )
        .map(|s| s.width),
        capabilities: CapabilitiesView {
            channel: capabilities(&root),
            orderer: orderer.map(capabilities).unwrap_or_default(),
            application: application.map(capabilities).unwrap_or_default(),
        },
        policies,
    })
}

/// Decode config value `key` as `M`. Absent or undecodable values are `None`.
fn value<M: Message + Default>(values: &HashMap<String, ConfigValue>, key: &str) -> Option<M> {
    let raw = values.get(key)?;
    match M::decode(raw.value.as_slice()) {
        Ok(v) => Some(v),
        Err(e) => {
            debug!(key, error = %e, "skipping undecodable config value");
            None
        }
    }
}

fn capabilities(group: &ConfigGroup) -> Vec<String> {
    let mut names: Vec<String> = value::<Capabilities>(&group.values, "Capabilities")
        .map(|c| c.capabilities.into_keys().collect())
        .unwrap_or_default();
    names.sort();
    names
}

fn msp(group: &ConfigGroup) -> Option<MspView> {
    let cfg = value::<MspConfig>(&group.values, "MSP")?;
    if cfg.r#type != MSP_FABRIC {
        return None;
    }
    let fabric = FabricMspConfig::decode(cfg.config.as_slice()).ok()?;
    Some(MspView {
        name: fabric.name,
        root_certs: fabric.root_certs,
        intermediate_certs: fabric.intermediate_certs,
        admins: fabric.admins,
        tls_root_certs: fabric.tls_root_certs,
        tls_intermediate_certs: fabric.tls_intermediate_certs,
    })
}

fn application_org(group: &ConfigGroup) -> ApplicationOrgView {
    ApplicationOrgView {
        msp: msp(group),
        anchor_peers: value::<AnchorPeers>(&group.values, "AnchorPeers")
            .map(|a| {
                a.anchor_peers
                    .into_iter()
                    .map(|p| HostPort {
                        host: p.host,
                        port: u32::try_from(p.port).unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default(),
    }
}

fn orderer_org(group: &ConfigGroup) -> OrdererOrgView {
    OrdererOrgView {
        msp: msp(group),
        endpoints: value::<OrdererAddresses>(&group.values, "Endpoints")
            .map(|a| a.addresses)
            .unwrap_or_default(),
    }
}

fn consensus(ct: ConsensusType) -> ConsensusView {
    let consenters = if is_bft_type(&ct.r#type) {
        match BftConfigMetadata::decode(ct.metadata.as_slice()) {
            Ok(md) => md
                .consenters
                .into_iter()
                .map(|c| ConsenterView {
                    id: Some(c.consenter_id),
                    host: c.host,
                    port: c.port,
                    msp_id: c.msp_id,
                    identity: decode_identity(&c.identity).ok(),
                    client_tls_cert: c.client_tls_cert,
                    server_tls_cert: c.server_tls_cert,
                })
                .collect(),
            Err(e) => {
                debug!(error = %e, "undecodable BFT consensus metadata");
                Vec::new()
            }
        }
    } else if ct.r#type == "etcdraft" {
        RaftConfigMetadata::decode(ct.metadata.as_slice())
            .map(|md| {
                md.consenters
                    .into_iter()
                    .map(|c| ConsenterView {
                        id: None,
                        host: c.host,
                        port: c.port,
                        msp_id: String::new(),
                        identity: None,
                        client_tls_cert: c.client_tls_cert,
                        server_tls_cert: c.server_tls_cert,
                    })
                    .collect()
            })
            .unwrap_or_default()
    } else {
        Vec::new()
    };

    ConsensusView {
        consensus_type: ct.r#type,
        state: ct.state,
        metadata: ct.metadata,
        consenters,
    }
}

// ─── Policies ────────────────────────────────────────────────────────────────

fn collect_policies(path: &str, group: &ConfigGroup, out: &mut BTreeMap<String, PolicyView>) {
    for (name, config_policy) in &group.policies {
        if let Some(view) = config_policy.policy.as_ref().and_then(policy) {
            out.insert(format!("{path}/{name}"), view);
        }
    }
    for (name, child) in &group.groups {
        collect_policies(&format!("{path}/{name}"), child, out);
    }
}

/// `SIGNATURE` and `IMPLICIT_META` policies decode; every other type is left
/// out of the view.
fn policy(p: &Policy) -> Option<PolicyView> {
    match p.r#type {
        policy_type::IMPLICIT_META => {
            let meta = ImplicitMetaPolicy::decode(p.value.as_slice()).ok()?;
            Some(PolicyView::ImplicitMeta {
                sub_policy: meta.sub_policy,
                rule: ImplicitMetaRule::from_i32(meta.rule)?,
            })
        }
        policy_type::SIGNATURE => {
            let env = SignaturePolicyEnvelope::decode(p.value.as_slice()).ok()?;
            Some(PolicyView::Signature {
                version: env.version,
                rule: signature_rule(env.rule.as_ref()?)?,
                identities: env.identities.iter().map(principal).collect(),
            })
        }
        _ => None,
    }
}

fn signature_rule(rule: &SignaturePolicy) -> Option<SignatureRule> {
    match rule.r#type.as_ref()? {
        signature_policy::Type::SignedBy(i) => Some(SignatureRule::SignedBy(*i)),
        signature_policy::Type::NOutOf(n) => Some(SignatureRule::NOutOf {
            n: n.n,
            rules: n.rules.iter().map(signature_rule).collect::<Option<_>>()?,
        }),
    }
}

fn principal(p: &chainwatch_core::proto::msp::MspPrincipal) -> PrincipalView {
    if p.principal_classification == PRINCIPAL_ROLE {
        if let Ok(role) = MspRole::decode(p.principal.as_slice()) {
            return PrincipalView::Role {
                msp_id: role.msp_identifier,
                role: msp_role_name(role.role),
            };
        }
    }
    PrincipalView::Other {
        code: p.principal_classification,
        principal: p.principal.clone(),
    }
}
