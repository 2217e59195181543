//! Chaincode argument decoding for selected `{chaincode, function}` pairs.

use std::sync::Arc;

use chainwatch_core::error::TransformError;
use chainwatch_core::model::BlockView;
use serde_json::Value;

use crate::Transformer;

/// Decodes the parameters of an invocation (`args[1..]`) into JSON values.
pub trait ArgsDecoder: Send + Sync {
    fn decode(&self, args: &[Vec<u8>]) -> Result<Vec<Value>, String>;
}

/// Blanket impl so closures can be used as argument decoders.
impl<F> ArgsDecoder for F
where
    F: Fn(&[Vec<u8>]) -> Result<Vec<Value>, String> + Send + Sync,
{
    fn decode(&self, args: &[Vec<u8>]) -> Result<Vec<Value>, String> {
        self(args)
    }
}

#[derive(Clone)]
struct Rule {
    chaincode: String,
    /// `None` matches every function of the chaincode.
    function: Option<String>,
    decoder: Arc<dyn ArgsDecoder>,
}

/// Sets `ChaincodeProposalView::decoded_args` on actions invoking a matching
/// chaincode function. The first matching rule wins.
#[derive(Clone, Default)]
pub struct ActionPayload {
    rules: Vec<Rule>,
}

impl ActionPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(
        mut self,
        chaincode: impl Into<String>,
        function: Option<&str>,
        decoder: impl ArgsDecoder + 'static,
    ) -> Self {
        self.rules.push(Rule {
            chaincode: chaincode.into(),
            function: function.map(str::to_string),
            decoder: Arc::new(decoder),
        });
        self
    }
}

impl Transformer for ActionPayload {
    fn name(&self) -> &str {
        "action-payload"
    }

    fn transform(&self, block: &mut BlockView) -> Result<(), TransformError> {
        let mut failures = Vec::new();
        let actions = block
            .transactions_mut()
            .flat_map(|tx| tx.actions.iter_mut());
        for action in actions {
            let proposal = &mut action.proposal;
            let function = proposal.function();
            let Some(rule) = self.rules.iter().find(|r| {
                r.chaincode == proposal.chaincode.name
                    && r
                        .function
                        .as_deref()
                        .map_or(true, |f| function.as_deref() == Some(f))
            }) else {
                continue;
            };
            let params = proposal.args.get(1..).unwrap_or_default();
            match rule.decoder.decode(params) {
                Ok(values) => proposal.decoded_args = Some(values),
                Err(e) => failures.push(format!(
                    "{}::{}: {e}",
                    proposal.chaincode.name,
                    function.unwrap_or_default()
                )),
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(TransformError::failed(self.name(), failures.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainwatch_core::fixtures::{BlockBuilder, EndorserTx};
    use chainwatch_parser::BlockParser;
    use serde_json::json;

    fn utf8_args(args: &[Vec<u8>]) -> Result<Vec<Value>, String> {
        args.iter()
            .map(|a| {
                String::from_utf8(a.clone())
                    .map(Value::String)
                    .map_err(|e| e.to_string())
            })
            .collect()
    }

    fn view(function: &str, args: &[&[u8]]) -> BlockView {
        let tx = args
            .iter()
            .fold(EndorserTx::new("c", "basic").arg(function), |tx, a| tx.arg(a));
        let block = BlockBuilder::new(1).envelope(tx.envelope()).build();
        BlockParser::new().parse(&block, None).unwrap()
    }

    fn decoded(view: &BlockView) -> Option<Vec<Value>> {
        view.envelopes[0].transaction().unwrap().actions[0]
            .proposal
            .decoded_args
            .clone()
    }

    #[test]
    fn decodes_matching_function() {
        let mut v = view("TransferAsset", &[b"asset1", b"bob"]);
        ActionPayload::new()
            .rule("basic", Some("TransferAsset"), utf8_args)
            .transform(&mut v)
            .unwrap();
        assert_eq!(decoded(&v), Some(vec![json!("asset1"), json!("bob")]));
    }

    #[test]
    fn other_functions_untouched() {
        let mut v = view("ReadAsset", &[b"asset1"]);
        ActionPayload::new()
            .rule("basic", Some("TransferAsset"), utf8_args)
            .transform(&mut v)
            .unwrap();
        assert_eq!(decoded(&v), None);
    }

    #[test]
    fn decoder_error_is_reported() {
        let mut v = view("Put", &[&[0xff, 0xfe]]);
        let err = ActionPayload::new()
            .rule("basic", None, utf8_args)
            .transform(&mut v)
            .unwrap_err();
        assert!(err.to_string().contains("basic::Put"));
    }
}
