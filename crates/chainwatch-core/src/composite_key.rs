//! Composite ledger keys: `NUL objectType NUL attr1 NUL … attrN NUL`.

use std::fmt;

const NS: char = '\u{0000}';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidKeyPart(pub String);

impl fmt::Display for InvalidKeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "composite key part {:?} contains a NUL character", self.0)
    }
}

impl std::error::Error for InvalidKeyPart {}

/// Whether `key` is encoded as a composite key.
pub fn is_composite(key: &str) -> bool {
    key.starts_with(NS)
}

/// Build a composite key. Parts may not contain NUL.
pub fn create<S: AsRef<str>>(object_type: &str, attributes: &[S]) -> Result<String, InvalidKeyPart> {
    let mut key = String::with_capacity(
        2 + object_type.len() + attributes.iter().map(|a| a.as_ref().len() + 1).sum::<usize>(),
    );
    key.push(NS);
    for part in std::iter::once(object_type).chain(attributes.iter().map(|a| a.as_ref())) {
        if part.contains(NS) {
            return Err(InvalidKeyPart(part.to_string()));
        }
        key.push_str(part);
        key.push(NS);
    }
    Ok(key)
}

/// Split a composite key into its object type and attributes. Returns `None`
/// for keys that are not composite.
pub fn split(key: &str) -> Option<(String, Vec<String>)> {
    let body = key.strip_prefix(NS)?;
    let body = body.strip_suffix(NS).unwrap_or(body);
    let mut parts = body.split(NS).map(str::to_string);
    let object_type = parts.next().unwrap_or_default();
    Some((object_type, parts.collect()))
}
