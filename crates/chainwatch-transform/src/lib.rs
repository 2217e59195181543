//! # chainwatch-transform
//!
//! Ordered, best-effort rewriting of parsed blocks before they are emitted.
//!
//! A [`Transformer`] mutates a [`BlockView`] in place. A [`TransformerChain`]
//! runs its transformers in declaration order; a transformer that fails or
//! panics is logged and reported, and the remaining transformers still run.
//!
//! ## Built-in transformers
//! - [`KeyReplace`] — composite keys to slash-delimited keys (`_lifecycle`).
//! - [`ProtoValueToJson`] — KV-write values to JSON by key-prefix rule.
//! - [`ObjectTypeReplace`] — composite-key object type mapping.
//! - [`ActionPayload`] — chaincode argument decoding by `{chaincode, function}`.

pub mod action_payload;
pub mod chain;
pub mod key_replace;
pub mod lifecycle;
pub mod object_type;
pub mod value_json;

pub use action_payload::{ActionPayload, ArgsDecoder};
pub use chain::TransformerChain;
pub use key_replace::KeyReplace;
pub use lifecycle::LifecycleStateDecoder;
pub use object_type::ObjectTypeReplace;
pub use value_json::{ProtoValueToJson, ValueDecoder};

use chainwatch_core::error::TransformError;
use chainwatch_core::model::{BlockView, NsReadWriteSetView};

/// A rewrite applied to every parsed block.
pub trait Transformer: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    fn transform(&self, block: &mut BlockView) -> Result<(), TransformError>;
}

/// Every namespace read-write set of every endorser transaction in `block`.
pub(crate) fn rwsets_mut(block: &mut BlockView) -> impl Iterator<Item = &mut NsReadWriteSetView> {
    block
        .transactions_mut()
        .flat_map(|tx| tx.actions.iter_mut())
        .flat_map(|action| action.endorsed_action.read_write_sets.iter_mut())
}

/// Apply `f` to every key of a namespace read-write set: reads, writes,
/// metadata writes, and range query reads.
pub(crate) fn for_each_key(rwset: &mut NsReadWriteSetView, mut f: impl FnMut(&mut String)) {
    let reads = rwset
        .reads
        .iter_mut()
        .chain(rwset.range_queries.iter_mut().flat_map(|q| q.reads.iter_mut()))
        .map(|r| &mut r.key);
    let writes = rwset.writes.iter_mut().map(|w| &mut w.key);
    let metadata = rwset.metadata_writes.iter_mut().map(|m| &mut m.key);
    reads.chain(writes).chain(metadata).for_each(&mut f);
}
