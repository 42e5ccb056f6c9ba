//! Post-quantum rail: ML-DSA-65 over the raw core bytes.

use serde::{Deserialize, Serialize};

use crate::crypto::mldsa;
use crate::encoding::multibase;
use crate::error::{DidError, Result};

/// A detached post-quantum signature over `coreBytes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Attestation {
    /// Always `ML-DSA-65`.
    pub alg: String,
    /// Verification method id of the signing key.
    pub vm: String,
    /// Signature, base64url without padding.
    pub sig: String,
}

/// Sign canonical core bytes with the root ML-DSA-65 secret key.
pub fn sign(core_bytes: &[u8], secret_key: &[u8], vm: &str) -> Result<Attestation> {
    if core_bytes.is_empty() {
        return Err(DidError::EmptyInput("core bytes".into()));
    }
    if secret_key.is_empty() {
        return Err(DidError::EmptyInput("attestation secret key".into()));
    }

    let signature = mldsa::sign(secret_key, core_bytes)?;
    log::debug!(
        "attested {} core bytes with {vm} ({} byte signature)",
        core_bytes.len(),
        signature.len()
    );
    Ok(Attestation {
        alg: mldsa::ALGORITHM.to_string(),
        vm: vm.to_string(),
        sig: multibase::base64url_encode(&signature),
    })
}

impl Attestation {
    /// Verify against the core bytes and the declared public key.
    pub fn verify(&self, core_bytes: &[u8], public_key: &[u8]) -> Result<()> {
        if self.alg != mldsa::ALGORITHM {
            return Err(DidError::CryptoVerificationFailure(format!(
                "attestation algorithm {:?} is not {}",
                self.alg,
                mldsa::ALGORITHM
            )));
        }
        let signature = multibase::base64url_decode(&self.sig)?;
        mldsa::verify(public_key, core_bytes, &signature)
    }
}
