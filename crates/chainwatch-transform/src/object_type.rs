//! Composite-key object type mapping.

use std::collections::HashMap;

use chainwatch_core::composite_key;
use chainwatch_core::error::TransformError;
use chainwatch_core::model::BlockView;

use crate::{for_each_key, rwsets_mut, Transformer};

/// Replaces the object type of composite keys using a fixed mapping, on
/// reads and writes of every namespace (or of one namespace).
#[derive(Debug, Clone, Default)]
pub struct ObjectTypeReplace {
    namespace: Option<String>,
    mapping: HashMap<String, String>,
}

impl ObjectTypeReplace {
    pub fn new<K, V>(mapping: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            namespace: None,
            mapping: mapping
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    fn rewrite(&self, key: &str) -> Option<Result<String, composite_key::InvalidKeyPart>> {
        let (object_type, attrs) = composite_key::split(key)?;
        let replacement = self.mapping.get(&object_type)?;
        Some(composite_key::create(replacement, &attrs))
    }
}

impl Transformer for ObjectTypeReplace {
    fn name(&self) -> &str {
        "object-type-replace"
    }

    fn transform(&self, block: &mut BlockView) -> Result<(), TransformError> {
        let mut failures = Vec::new();
        let selected = rwsets_mut(block).filter(|rw| {
            self.namespace
                .as_deref()
                .map_or(true, |ns| ns == rw.namespace)
        });
        for rwset in selected {
            for_each_key(rwset, |key| match self.rewrite(key) {
                Some(Ok(new_key)) => *key = new_key,
                Some(Err(e)) => failures.push(e.to_string()),
                None => {}
            });
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(TransformError::failed(self.name(), failures.join("; ")))
        }
    }
}
