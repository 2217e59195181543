//! Endorser transaction decoding down to the per-namespace read-write sets.

use chainwatch_core::error::ParseError;
use chainwatch_core::model::{
    ChaincodeEndorsedActionView, ChaincodeEventView, ChaincodeProposalView, ChaincodeRef,
    CollectionHashedView, EndorsementView, KvMetadataWriteView, KvReadHashView, KvReadView,
    KvVersion, KvWriteHashView, KvWriteView, NsReadWriteSetView, RangeQueryView, ResponseView,
    TransactionActionView, TransactionView,
};
use chainwatch_core::proto::peer::{
    ChaincodeAction, ChaincodeActionPayload, ChaincodeEvent, ChaincodeId,
    ChaincodeInvocationSpec, ChaincodeProposalPayload, ProposalResponsePayload, Transaction,
};
use chainwatch_core::proto::rwset::{
    HashedRwSet, KvRead, KvRwSet, NsReadWriteSet, TxReadWriteSet, Version,
};
use chainwatch_core::proto::SignatureHeader;
use prost::Message;

use crate::envelope::decode_identity;

pub(crate) fn parse_transaction(data: &[u8]) -> Result<TransactionView, ParseError> {
    let tx = Transaction::decode(data).map_err(ParseError::decode("transaction"))?;
    let actions = tx
        .actions
        .iter()
        .map(|action| parse_action(&action.header, &action.payload))
        .collect::<Result<_, _>>()?;
    Ok(TransactionView { actions })
}

fn parse_action(header: &[u8], payload: &[u8]) -> Result<TransactionActionView, ParseError> {
    let header =
        SignatureHeader::decode(header).map_err(ParseError::decode("action signature header"))?;
    let creator =
        decode_identity(&header.creator).map_err(ParseError::decode("action creator"))?;

    let payload = ChaincodeActionPayload::decode(payload)
        .map_err(ParseError::decode("chaincode action payload"))?;
    let proposal = parse_proposal(&payload.chaincode_proposal_payload)?;
    let endorsed = payload.action.ok_or(ParseError::MissingField {
        field: "chaincode_action_payload.action",
    })?;

    let response_payload =
        ProposalResponsePayload::decode(endorsed.proposal_response_payload.as_slice())
            .map_err(ParseError::decode("proposal response payload"))?;
    let cc_action = ChaincodeAction::decode(response_payload.extension.as_slice())
        .map_err(ParseError::decode("chaincode action"))?;

    let endorsements = endorsed
        .endorsements
        .iter()
        .map(|e| {
            Ok(EndorsementView {
                endorser: decode_identity(&e.endorser).map_err(ParseError::decode("endorser"))?,
                signature: e.signature.clone(),
            })
        })
        .collect::<Result<_, ParseError>>()?;

    let event = if cc_action.events.is_empty() {
        None
    } else {
        let ev = ChaincodeEvent::decode(cc_action.events.as_slice())
            .map_err(ParseError::decode("chaincode event"))?;
        Some(ChaincodeEventView {
            chaincode_id: ev.chaincode_id,
            tx_id: ev.tx_id,
            event_name: ev.event_name,
            payload: ev.payload,
        })
    };

    Ok(TransactionActionView {
        creator,
        nonce: header.nonce,
        proposal,
        endorsed_action: ChaincodeEndorsedActionView {
            chaincode: chaincode_ref(cc_action.chaincode_id),
            proposal_hash: response_payload.proposal_hash,
            read_write_sets: parse_rwsets(&cc_action.results)?,
            event,
            response: cc_action.response.map(|r| ResponseView {
                status: r.status,
                message: r.message,
                payload: r.payload,
            }),
            endorsements,
        },
        proposal_response_payload: endorsed.proposal_response_payload,
    })
}

fn chaincode_ref(id: Option<ChaincodeId>) -> ChaincodeRef {
    id.map(|id| ChaincodeRef {
        name: id.name,
        version: id.version,
        path: id.path,
    })
    .unwrap_or_default()
}

fn parse_proposal(bytes: &[u8]) -> Result<ChaincodeProposalView, ParseError> {
    let payload = ChaincodeProposalPayload::decode(bytes)
        .map_err(ParseError::decode("chaincode proposal payload"))?;
    let spec = ChaincodeInvocationSpec::decode(payload.input.as_slice())
        .map_err(ParseError::decode("chaincode invocation spec"))?
        .chaincode_spec
        .unwrap_or_default();
    let input = spec.input.unwrap_or_default();

    Ok(ChaincodeProposalView {
        chaincode: chaincode_ref(spec.chaincode_id),
        args: input.args,
        is_init: input.is_init,
        transient_map: payload.transient_map.into_iter().collect(),
        decoded_args: None,
    })
}

fn version(v: Option<Version>) -> Option<KvVersion> {
    v.map(|v| KvVersion {
        block_num: v.block_num,
        tx_num: v.tx_num,
    })
}

fn read(r: KvRead) -> KvReadView {
    KvReadView {
        key: r.key,
        version: version(r.version),
    }
}

fn parse_rwsets(results: &[u8]) -> Result<Vec<NsReadWriteSetView>, ParseError> {
    if results.is_empty() {
        return Ok(Vec::new());
    }
    let tx_rwset =
        TxReadWriteSet::decode(results).map_err(ParseError::decode("tx read-write set"))?;
    tx_rwset.ns_rwset.into_iter().map(parse_ns_rwset).collect()
}

fn parse_ns_rwset(ns: NsReadWriteSet) -> Result<NsReadWriteSetView, ParseError> {
    let kv = KvRwSet::decode(ns.rwset.as_slice()).map_err(ParseError::decode("kv read-write set"))?;

    let collection_hashed = ns
        .collection_hashed_rwset
        .into_iter()
        .map(|c| {
            let hashed = HashedRwSet::decode(c.hashed_rwset.as_slice())
                .map_err(ParseError::decode("hashed read-write set"))?;
            Ok(CollectionHashedView {
                collection_name: c.collection_name,
                hashed_reads: hashed
                    .hashed_reads
                    .into_iter()
                    .map(|r| KvReadHashView {
                        key_hash: r.key_hash,
                        version: version(r.version),
                    })
                    .collect(),
                hashed_writes: hashed
                    .hashed_writes
                    .into_iter()
                    .map(|w| KvWriteHashView {
                        key_hash: w.key_hash,
                        is_delete: w.is_delete,
                        value_hash: w.value_hash,
                        is_purge: w.is_purge,
                    })
                    .collect(),
                pvt_rwset_hash: c.pvt_rwset_hash,
            })
        })
        .collect::<Result<_, ParseError>>()?;

    Ok(NsReadWriteSetView {
        namespace: ns.namespace,
        reads: kv.reads.into_iter().map(read).collect(),
        writes: kv
            .writes
            .into_iter()
            .map(|w| KvWriteView {
                key: w.key,
                value: w.value,
                is_delete: w.is_delete,
                decoded: None,
            })
            .collect(),
        range_queries: kv
            .range_queries_info
            .into_iter()
            .map(|q| RangeQueryView {
                start_key: q.start_key,
                end_key: q.end_key,
                itr_exhausted: q.itr_exhausted,
                reads: q
                    .raw_reads
                    .map(|r| r.kv_reads.into_iter().map(read).collect())
                    .unwrap_or_default(),
            })
            .collect(),
        metadata_writes: kv
            .metadata_writes
            .into_iter()
            .map(|m| KvMetadataWriteView {
                key: m.key,
                entries: m.entries.into_iter().map(|e| (e.name, e.value)).collect(),
            })
            .collect(),
        collection_hashed,
    })
}
