//! Method-wide constants and identifier helpers for `did:pqdid`.

use sha2::{Digest, Sha256};

use crate::error::{DidError, Result};

/// Every identifier of this method starts with this prefix.
pub const DID_PREFIX: &str = "did:pqdid:";

/// The `@context` list, in order.
pub const REQUIRED_CONTEXTS: [&str; 3] = [
    "https://www.w3.org/ns/did/v1",
    "https://w3id.org/security/multikey/v1",
    "https://w3id.org/pqdid/v1",
];

pub const FRAGMENT_PQ_ROOT: &str = "pq-root";
pub const FRAGMENT_PQ_AUTH: &str = "pq-auth";
pub const FRAGMENT_ES256: &str = "es256";
pub const FRAGMENT_KEM: &str = "kem";
pub const FRAGMENT_ED25519: &str = "ed25519";
pub const FRAGMENT_X25519: &str = "x25519";

/// Fragments every document must declare.
pub const REQUIRED_FRAGMENTS: [&str; 6] = [
    FRAGMENT_PQ_ROOT,
    FRAGMENT_PQ_AUTH,
    FRAGMENT_ES256,
    FRAGMENT_KEM,
    FRAGMENT_ED25519,
    FRAGMENT_X25519,
];

pub const VERIFICATION_METHOD_TYPE: &str = "Multikey";
pub const PROOF_TYPE: &str = "JsonWebSignature2020";
pub const PROOF_PURPOSE: &str = "assertionMethod";

/// Derive an identifier from the root post-quantum public key.
///
/// The suffix is base58btc of the first 16 bytes of SHA-256 of the key.
pub fn did_from_root_key(root_public_key: &[u8]) -> String {
    let hash = Sha256::digest(root_public_key);
    let encoded = bs58::encode(&hash[..16]).into_string();
    format!("{DID_PREFIX}{encoded}")
}

/// Verification-method id: `<did>#<fragment>`.
pub fn vm_id(did: &str, fragment: &str) -> String {
    format!("{did}#{fragment}")
}

/// Fragment part of a verification-method id, if any.
pub fn fragment_of(vm: &str) -> Option<&str> {
    vm.split_once('#').map(|(_, fragment)| fragment)
}

/// Require the method prefix and a non-empty suffix.
pub fn validate_did(did: &str) -> Result<()> {
    match did.strip_prefix(DID_PREFIX) {
        Some(suffix) if !suffix.is_empty() => Ok(()),
        Some(_) => Err(DidError::structural(format!(
            "identifier {did:?} has an empty method-specific suffix"
        ))),
        None => Err(DidError::structural(format!(
            "identifier {did:?} does not start with {DID_PREFIX}"
        ))),
    }
}
