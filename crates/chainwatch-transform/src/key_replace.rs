//! Composite keys to readable slash-delimited keys.

use chainwatch_core::composite_key;
use chainwatch_core::error::TransformError;
use chainwatch_core::model::BlockView;

use crate::{for_each_key, rwsets_mut, Transformer};

/// Namespace of the chaincode lifecycle system chaincode.
pub const LIFECYCLE_NAMESPACE: &str = "_lifecycle";

/// Rewrites composite keys of one namespace as `type/attr1/…/attrN`.
/// Keys that are not composite are left unchanged.
#[derive(Debug, Clone)]
pub struct KeyReplace {
    name: String,
    namespace: String,
    separator: String,
}

impl KeyReplace {
    pub fn new(namespace: impl Into<String>, separator: impl Into<String>) -> Self {
        let namespace = namespace.into();
        Self {
            name: format!("key-replace:{namespace}"),
            namespace,
            separator: separator.into(),
        }
    }

    /// Lifecycle state keys, e.g. `\0namespaces\0fields\0basic\0Sequence\0`
    /// becomes `namespaces/fields/basic/Sequence`.
    pub fn lifecycle() -> Self {
        Self::new(LIFECYCLE_NAMESPACE, "/")
    }

    fn rewrite(&self, key: &mut String) {
        if let Some((object_type, attrs)) = composite_key::split(key) {
            let mut parts = Vec::with_capacity(attrs.len() + 1);
            parts.push(object_type);
            parts.extend(attrs);
            *key = parts.join(&self.separator);
        }
    }
}

impl Transformer for KeyReplace {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(&self, block: &mut BlockView) -> Result<(), TransformError> {
        for rwset in rwsets_mut(block).filter(|rw| rw.namespace == self.namespace) {
            for_each_key(rwset, |key| self.rewrite(key));
        }
        Ok(())
    }
}
