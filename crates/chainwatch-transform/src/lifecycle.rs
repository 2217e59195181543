//! Decoding of chaincode lifecycle state values.
//!
//! The lifecycle system chaincode stores two kinds of values:
//! `namespaces/metadata/<name>` holds a `StateMetadata` naming the datatype
//! and its fields, `namespaces/fields/<name>/<field>` holds one `StateData`.

use prost::Message;
use serde_json::{json, Value};

use crate::value_json::ValueDecoder;

#[derive(Clone, PartialEq, prost::Message)]
pub struct StateMetadata {
    #[prost(string, tag = "1")]
    pub datatype: String,
    #[prost(string, repeated, tag = "2")]
    pub fields: Vec<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct StateData {
    #[prost(oneof = "state_data::Type", tags = "1, 2, 3")]
    pub r#type: Option<state_data::Type>,
}

pub mod state_data {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Type {
        #[prost(int64, tag = "1")]
        Int64(i64),
        #[prost(bytes, tag = "2")]
        Bytes(Vec<u8>),
        #[prost(string, tag = "3")]
        String(String),
    }
}

/// [`ValueDecoder`] for lifecycle state: metadata keys decode to
/// `{"datatype", "fields"}`, field keys to a bare JSON value (bytes as hex).
#[derive(Debug, Clone, Copy, Default)]
pub struct LifecycleStateDecoder;

impl ValueDecoder for LifecycleStateDecoder {
    fn decode(&self, key: &str, value: &[u8]) -> Result<Value, String> {
        if key.contains("metadata/") {
            let md = StateMetadata::decode(value).map_err(|e| e.to_string())?;
            return Ok(json!({ "datatype": md.datatype, "fields": md.fields }));
        }
        let data = StateData::decode(value).map_err(|e| e.to_string())?;
        Ok(match data.r#type {
            Some(state_data::Type::Int64(n)) => json!(n),
            Some(state_data::Type::Bytes(b)) => json!(hex::encode(b)),
            Some(state_data::Type::String(s)) => json!(s),
            None => Value::Null,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_metadata() {
        let raw = StateMetadata {
            datatype: "ChaincodeDefinition".into(),
            fields: vec!["Sequence".into(), "EndorsementInfo".into()],
        }
        .encode_to_vec();
        let v = LifecycleStateDecoder
            .decode("namespaces/metadata/basic", &raw)
            .unwrap();
        assert_eq!(v["datatype"], "ChaincodeDefinition");
        assert_eq!(v["fields"][1], "EndorsementInfo");
    }

    #[test]
    fn decodes_field_values() {
        let seq = StateData {
            r#type: Some(state_data::Type::Int64(3)),
        }
        .encode_to_vec();
        assert_eq!(
            LifecycleStateDecoder
                .decode("namespaces/fields/basic/Sequence", &seq)
                .unwrap(),
            json!(3)
        );

        let bytes = StateData {
            r#type: Some(state_data::Type::Bytes(vec![0xde, 0xad])),
        }
        .encode_to_vec();
        assert_eq!(
            LifecycleStateDecoder
                .decode("namespaces/fields/basic/Collections", &bytes)
                .unwrap(),
            json!("dead")
        );
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(LifecycleStateDecoder
            .decode("namespaces/fields/basic/Sequence", &[0x0a, 0x09])
            .is_err());
    }
}
