//! Signing identity used to authenticate seek requests.

use sha2::{Digest, Sha256};

use crate::error::IdentityError;

/// The client identity. Credentials are managed outside the core; the core
/// only asks for signatures and the serialized creator.
pub trait SigningIdentity: Send + Sync {
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, IdentityError>;

    /// Marshalled `msp::SerializedIdentity` of this client.
    fn serialize(&self) -> Vec<u8>;

    /// Human-readable identifier, used in logs.
    fn identifier(&self) -> String;
}

/// Transaction id of a proposal: `hex(sha256(nonce ∥ creator))`.
pub fn compute_tx_id(nonce: &[u8], creator: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(nonce);
    hasher.update(creator);
    hex::encode(hasher.finalize())
}
