//! KV-write values to JSON, selected by namespace and key prefix.

use std::sync::Arc;

use chainwatch_core::error::TransformError;
use chainwatch_core::model::BlockView;
use serde_json::Value;

use crate::key_replace::LIFECYCLE_NAMESPACE;
use crate::lifecycle::LifecycleStateDecoder;
use crate::{rwsets_mut, Transformer};

/// Decodes one stored value into JSON.
pub trait ValueDecoder: Send + Sync {
    fn decode(&self, key: &str, value: &[u8]) -> Result<Value, String>;
}

/// Blanket impl so closures can be used as value decoders.
impl<F> ValueDecoder for F
where
    F: Fn(&str, &[u8]) -> Result<Value, String> + Send + Sync,
{
    fn decode(&self, key: &str, value: &[u8]) -> Result<Value, String> {
        self(key, value)
    }
}

#[derive(Clone)]
struct Rule {
    namespace: Option<String>,
    key_prefix: String,
    decoder: Arc<dyn ValueDecoder>,
}

impl Rule {
    fn matches(&self, namespace: &str, key: &str) -> bool {
        self.namespace.as_deref().map_or(true, |ns| ns == namespace)
            && key.starts_with(&self.key_prefix)
    }
}

/// Sets `KvWriteView::decoded` for every non-delete write whose key matches a
/// rule. The first matching rule wins.
#[derive(Clone, Default)]
pub struct ProtoValueToJson {
    rules: Vec<Rule>,
}

impl ProtoValueToJson {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode values of keys starting with `key_prefix`, in `namespace` or in
    /// every namespace when `None`.
    pub fn rule(
        mut self,
        namespace: Option<&str>,
        key_prefix: impl Into<String>,
        decoder: impl ValueDecoder + 'static,
    ) -> Self {
        self.rules.push(Rule {
            namespace: namespace.map(str::to_string),
            key_prefix: key_prefix.into(),
            decoder: Arc::new(decoder),
        });
        self
    }

    /// Lifecycle state values. Expects keys already rewritten by
    /// [`KeyReplace::lifecycle`](crate::KeyReplace::lifecycle).
    pub fn lifecycle() -> Self {
        Self::new()
            .rule(Some(LIFECYCLE_NAMESPACE), "namespaces/metadata/", LifecycleStateDecoder)
            .rule(Some(LIFECYCLE_NAMESPACE), "namespaces/fields/", LifecycleStateDecoder)
    }
}

impl Transformer for ProtoValueToJson {
    fn name(&self) -> &str {
        "proto-value-to-json"
    }

    fn transform(&self, block: &mut BlockView) -> Result<(), TransformError> {
        let mut failures = Vec::new();
        for rwset in rwsets_mut(block) {
            for write in rwset.writes.iter_mut().filter(|w| !w.is_delete) {
                let Some(rule) = self
                    .rules
                    .iter()
                    .find(|r| r.matches(&rwset.namespace, &write.key))
                else {
                    continue;
                };
                match rule.decoder.decode(&write.key, &write.value) {
                    Ok(v) => write.decoded = Some(v),
                    Err(e) => failures.push(format!("{}: {e}", write.key.escape_debug())),
                }
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(TransformError::failed(self.name(), failures.join("; ")))
        }
    }
}
