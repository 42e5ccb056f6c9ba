//! ES256 (ECDSA P-256 over SHA-256) signing and verification.
//!
//! The classical rail can be signed either in-process with a software key or
//! through an opaque external handle, such as a secure element. Every
//! signature leaving this module is 64-byte `r || s` in low-S form.

use std::fmt;
use std::sync::Arc;

use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;

use crate::error::{DidError, Result};

/// JOSE algorithm name.
pub const ALGORITHM: &str = "ES256";
/// Raw `r || s` signature length.
pub const SIGNATURE_LEN: usize = 64;

/// A signing capability that lives outside this process.
///
/// Implementations sign `message` with ECDSA P-256 over SHA-256 and return
/// either a DER-encoded signature or raw 64-byte `r || s`. Errors are
/// reported as [`DidError::SignerFailure`] and never retried here.
pub trait ExternalSigner: Send + Sync {
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>>;

    /// Short name used in log lines.
    fn label(&self) -> &str {
        "external"
    }
}

/// The signer used for the classical proof.
#[derive(Clone)]
pub enum ClassicalSigner {
    Software(SigningKey),
    External(Arc<dyn ExternalSigner>),
}

impl ClassicalSigner {
    /// Generate a fresh in-process P-256 key.
    pub fn generate() -> Self {
        Self::Software(SigningKey::random(&mut OsRng))
    }

    /// Pick exactly one of the supplied signers.
    pub fn select(
        software: Option<SigningKey>,
        external: Option<Arc<dyn ExternalSigner>>,
    ) -> Result<Self> {
        match (software, external) {
            (Some(key), None) => Ok(Self::Software(key)),
            (None, Some(handle)) => Ok(Self::External(handle)),
            (None, None) => Err(DidError::SignatureUnavailable),
            (Some(_), Some(_)) => Err(DidError::InvalidKey(
                "both a software key and an external signer were supplied".into(),
            )),
        }
    }

    /// Sign `message`, returning a low-S signature.
    pub fn sign(&self, message: &[u8]) -> Result<Signature> {
        match self {
            Self::Software(key) => {
                let signature: Signature = key.sign(message);
                Ok(normalize_low_s(signature))
            }
            Self::External(handle) => {
                let raw = handle.sign(message).map_err(|e| match e {
                    DidError::SignerFailure(msg) => DidError::SignerFailure(msg),
                    other => DidError::SignerFailure(other.to_string()),
                })?;
                log::debug!("{} signer returned {} bytes", handle.label(), raw.len());
                let signature = parse_signature(&raw)
                    .map_err(|e| DidError::SignerFailure(format!("unusable signature: {e}")))?;
                Ok(normalize_low_s(signature))
            }
        }
    }

    /// Compressed SEC1 public key, when the key is held in-process.
    pub fn software_public_key(&self) -> Option<Vec<u8>> {
        match self {
            Self::Software(key) => Some(public_key_bytes(key)),
            Self::External(_) => None,
        }
    }
}

impl fmt::Debug for ClassicalSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Software(_) => f.write_str("ClassicalSigner::Software(..)"),
            Self::External(handle) => write!(f, "ClassicalSigner::External({})", handle.label()),
        }
    }
}

/// Compressed SEC1 encoding of a signing key's public half.
pub fn public_key_bytes(key: &SigningKey) -> Vec<u8> {
    key.verifying_key()
        .to_encoded_point(true)
        .as_bytes()
        .to_vec()
}

/// Replace `s` with `n - s` when `s` is in the upper half of the order.
pub fn normalize_low_s(signature: Signature) -> Signature {
    signature.normalize_s().unwrap_or(signature)
}

/// Accept raw `r || s` or DER.
pub fn parse_signature(bytes: &[u8]) -> Result<Signature> {
    if bytes.len() == SIGNATURE_LEN {
        Signature::from_slice(bytes)
            .map_err(|e| DidError::malformed(format!("invalid r||s signature: {e}")))
    } else {
        Signature::from_der(bytes)
            .map_err(|e| DidError::malformed(format!("invalid DER signature: {e}")))
    }
}

/// Verify a raw `r || s` signature against a SEC1 public key.
///
/// High-S signatures are rejected.
pub fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<()> {
    let verifying_key = VerifyingKey::from_sec1_bytes(public_key)
        .map_err(|_| DidError::InvalidKey("invalid P-256 public key".into()))?;
    if signature.len() != SIGNATURE_LEN {
        return Err(DidError::CryptoVerificationFailure(format!(
            "ES256 signature must be {SIGNATURE_LEN} bytes, got {}",
            signature.len()
        )));
    }
    let signature = Signature::from_slice(signature).map_err(|_| {
        DidError::CryptoVerificationFailure("ES256 signature is not a valid scalar pair".into())
    })?;
    if signature.normalize_s().is_some() {
        return Err(DidError::CryptoVerificationFailure(
            "ES256 signature is not in low-S form".into(),
        ));
    }
    verifying_key
        .verify(message, &signature)
        .map_err(|_| DidError::CryptoVerificationFailure("ES256 signature does not verify".into()))
}
