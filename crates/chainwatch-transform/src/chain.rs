//! `TransformerChain` — runs transformers in order, isolating failures.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use chainwatch_core::error::TransformError;
use chainwatch_core::model::BlockView;
use tracing::warn;

use crate::Transformer;

/// An ordered list of transformers. Cheap to clone.
#[derive(Clone, Default)]
pub struct TransformerChain {
    transformers: Vec<Arc<dyn Transformer>>,
}

impl TransformerChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transformer. Transformers run in the order they are added.
    pub fn with(mut self, transformer: impl Transformer + 'static) -> Self {
        self.transformers.push(Arc::new(transformer));
        self
    }

    pub fn push(&mut self, transformer: Arc<dyn Transformer>) {
        self.transformers.push(transformer);
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.transformers.iter().map(|t| t.name()).collect()
    }

    /// Run every transformer over `block`. Returns the errors of the
    /// transformers that failed or panicked; the block keeps whatever the
    /// others changed.
    pub fn apply(&self, block: &mut BlockView) -> Vec<TransformError> {
        let mut errors = Vec::new();
        for transformer in &self.transformers {
            let result = catch_unwind(AssertUnwindSafe(|| transformer.transform(block)))
                .unwrap_or_else(|panic| {
                    Err(TransformError::Panicked {
                        transformer: transformer.name().to_string(),
                        message: panic_message(panic.as_ref()),
                    })
                });
            if let Err(e) = result {
                warn!(
                    block = block.number(),
                    transformer = transformer.name(),
                    error = %e,
                    "transformer failed, continuing"
                );
                errors.push(e);
            }
        }
        errors
    }
}

impl std::fmt::Debug for TransformerChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
