//! Whole-block parsing against fixture blocks.

use chainwatch_core::fixtures::{
    raw_envelope, serialized_identity, BlockBuilder, ConfigFixture, ConsenterFixture, EndorserTx,
};
use chainwatch_core::identity::compute_tx_id;
use chainwatch_core::model::{EnvelopePayload, HeaderType, KvVersion, ValidationCode};
use chainwatch_core::proto::Block;
use chainwatch_parser::BlockParser;
use prost::Message;

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn mixed_block() -> Block {
    BlockBuilder::new(12)
        .previous_hash(&[0xaa; 32])
        .envelope(
            EndorserTx::new("mychannel", "basic")
                .tx_id("tx-transfer")
                .arg("TransferAsset")
                .arg("asset1")
                .arg("bob")
                .transient("secret", b"shh")
                .read("basic", "asset1", Some((10, 0)))
                .write("basic", "asset1", br#"{"owner":"bob"}"#)
                .event("Transfer", b"asset1")
                .envelope(),
        )
        .envelope(
            EndorserTx::new("mychannel", "basic")
                .nonce(b"n-2")
                .arg("DeleteAsset")
                .delete("basic", "asset2")
                .envelope(),
        )
        .envelope(raw_envelope("mychannel", HeaderType::Message, b"opaque"))
        .flags(&[0, 11, 0])
        .orderer_signature(serialized_identity("OrdererMSP", b"orderer-cert"), b"osig")
        .last_config(0)
        .build()
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[test]
fn parses_mixed_block() {
    let view = BlockParser::new().parse(&mixed_block(), None).unwrap();

    assert_eq!(view.number(), 12);
    assert_eq!(view.header.previous_hash, vec![0xaa; 32]);
    assert_eq!(view.envelopes.len(), 3);
    assert_eq!(view.valid_envelopes().count(), 2);
    assert_eq!(view.envelopes[1].validation_code, ValidationCode(11));
    assert_eq!(view.metadata.last_config_index, Some(0));
    assert_eq!(view.metadata.orderer_signatures.len(), 1);
    assert_eq!(view.metadata.orderer_signatures[0].identity.msp_id, "OrdererMSP");

    let first = &view.envelopes[0];
    assert_eq!(first.tx_id(), "tx-transfer");
    let action = &first.transaction().unwrap().actions[0];
    assert_eq!(action.proposal.chaincode.name, "basic");
    assert_eq!(action.proposal.function().as_deref(), Some("TransferAsset"));
    assert_eq!(action.proposal.args.len(), 3);
    assert_eq!(action.proposal.transient_map["secret"], b"shh");
    assert_eq!(action.creator.msp_id, "Org1MSP");

    let endorsed = &action.endorsed_action;
    assert_eq!(endorsed.chaincode.version, "1.0");
    assert_eq!(endorsed.endorsements.len(), 1);
    assert_eq!(endorsed.response.as_ref().unwrap().status, 200);
    assert_eq!(endorsed.event.as_ref().unwrap().event_name, "Transfer");

    let rwset = &endorsed.read_write_sets[0];
    assert_eq!(rwset.namespace, "basic");
    assert_eq!(
        rwset.reads[0].version,
        Some(KvVersion {
            block_num: 10,
            tx_num: 0
        })
    );
    assert_eq!(rwset.writes[0].value, br#"{"owner":"bob"}"#);
    assert!(!rwset.writes[0].is_delete);

    let second = &view.envelopes[1];
    let creator = serialized_identity(
        "Org1MSP",
        &chainwatch_core::fixtures::fake_certificate("User1@org1"),
    );
    assert_eq!(second.tx_id(), compute_tx_id(b"n-2", &creator));
    let write = &second.transaction().unwrap().actions[0]
        .endorsed_action
        .read_write_sets[0]
        .writes[0];
    assert!(write.is_delete);

    assert!(matches!(
        &view.envelopes[2].payload,
        EnvelopePayload::Raw { raw_unparsed } if raw_unparsed == b"opaque"
    ));
}

#[test]
fn parse_bytes_matches_parse() {
    let block = mixed_block();
    let parser = BlockParser::new();
    assert_eq!(
        parser.parse_bytes(&block.encode_to_vec(), None).unwrap(),
        parser.parse(&block, None).unwrap()
    );
}

#[test]
fn parsing_is_deterministic() {
    let block = mixed_block();
    let a = BlockParser::new().parse(&block, None).unwrap();
    let b = BlockParser::new().parse(&block, None).unwrap();
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn config_block_becomes_config_view() {
    let block = ConfigFixture::new("mychannel")
        .application_org("Org1MSP", &[("peer0.org1.example.com", 7051)])
        .application_org("Org2MSP", &[])
        .orderer_org("OrdererMSP", &["orderer.example.com:7050"])
        .block(0);
    let view = BlockParser::new().parse(&block, None).unwrap();
    assert_eq!(view.envelopes[0].header_type(), HeaderType::Config);

    let cfg = view.channel_config().unwrap();
    assert_eq!(cfg.applications.len(), 2);
    assert!(cfg.policies.contains_key("Channel/Admins"));
    assert!(cfg.policies.contains_key("Channel/Orderer/OrdererMSP/Readers"));
}

#[test]
fn bft_block_lists_every_consenter_signature() {
    let config = ConfigFixture::new("mychannel")
        .bft(vec![
            ConsenterFixture::new(1, "Orderer1MSP"),
            ConsenterFixture::new(2, "Orderer2MSP"),
            ConsenterFixture::new(3, "Orderer3MSP"),
            ConsenterFixture::new(4, "Orderer4MSP"),
        ])
        .block(0);
    let block = BlockBuilder::new(1)
        .envelope(EndorserTx::new("mychannel", "basic").arg("Init").envelope())
        .bft_signature(1, b"sig-1")
        .bft_signature(2, b"sig-2")
        .bft_signature(4, b"sig-4")
        .build();

    let view = BlockParser::new().parse(&block, Some(&config)).unwrap();
    let signers: Vec<_> = view
        .metadata
        .orderer_signatures
        .iter()
        .map(|s| s.identity.msp_id.as_str())
        .collect();
    assert_eq!(signers, vec!["Orderer1MSP", "Orderer2MSP", "Orderer4MSP"]);

    // Without the config block only the primary path runs; BFT signatures
    // carry no creator, so nothing is attributed.
    let view = BlockParser::new().parse(&block, None).unwrap();
    assert!(view.metadata.orderer_signatures.is_empty());
}

#[test]
fn json_renders_bytes_as_hex() {
    let view = BlockParser::new().parse(&mixed_block(), None).unwrap();
    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["header"]["previous_hash"], hex::encode([0xaa; 32]));
    assert_eq!(
        json["envelopes"][0]["payload"]["kind"],
        "endorser_transaction"
    );
    assert_eq!(json["envelopes"][2]["payload"]["raw_unparsed"], hex::encode("opaque"));
}
