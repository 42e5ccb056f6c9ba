//! ML-DSA-65 signing and verification.
//!
//! Signing is hedged (randomized) with an empty context string, so two
//! signatures over the same message differ while both verify.

use fips204::ml_dsa_65;
use fips204::traits::{SerDes, Signer, Verifier};
use zeroize::Zeroizing;

use crate::error::{DidError, Result};

/// Algorithm name recorded in attestations.
pub const ALGORITHM: &str = "ML-DSA-65";
pub const PUBLIC_KEY_LEN: usize = ml_dsa_65::PK_LEN;
pub const SECRET_KEY_LEN: usize = ml_dsa_65::SK_LEN;
pub const SIGNATURE_LEN: usize = ml_dsa_65::SIG_LEN;

/// An ML-DSA-65 key pair held as encoded bytes.
///
/// The secret bytes are zeroized on drop.
pub struct MlDsaKeyPair {
    public: Vec<u8>,
    secret: Zeroizing<Vec<u8>>,
}

impl MlDsaKeyPair {
    /// Generate a fresh key pair from the OS random source.
    pub fn generate() -> Result<Self> {
        let (pk, sk) = ml_dsa_65::try_keygen()
            .map_err(|e| DidError::InvalidKey(format!("ML-DSA-65 key generation failed: {e}")))?;
        Ok(Self {
            public: pk.into_bytes().to_vec(),
            secret: Zeroizing::new(sk.into_bytes().to_vec()),
        })
    }

    pub fn public_key_bytes(&self) -> &[u8] {
        &self.public
    }

    /// Encoded secret key. Do not log or persist unencrypted.
    pub fn secret_key_bytes(&self) -> &[u8] {
        &self.secret
    }
}

impl std::fmt::Debug for MlDsaKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MlDsaKeyPair")
            .field("public_len", &self.public.len())
            .finish_non_exhaustive()
    }
}

/// Sign `message` with an encoded ML-DSA-65 secret key.
pub fn sign(secret_key: &[u8], message: &[u8]) -> Result<Vec<u8>> {
    let mut sk_bytes = Zeroizing::new([0u8; SECRET_KEY_LEN]);
    if secret_key.len() != SECRET_KEY_LEN {
        return Err(DidError::InvalidKey(format!(
            "ML-DSA-65 secret key must be {SECRET_KEY_LEN} bytes, got {}",
            secret_key.len()
        )));
    }
    sk_bytes.copy_from_slice(secret_key);
    let sk = ml_dsa_65::PrivateKey::try_from_bytes(*sk_bytes)
        .map_err(|e| DidError::InvalidKey(format!("invalid ML-DSA-65 secret key: {e}")))?;
    let signature = sk
        .try_sign(message, &[])
        .map_err(|e| DidError::InvalidKey(format!("ML-DSA-65 signing failed: {e}")))?;
    Ok(signature.to_vec())
}

/// Verify an ML-DSA-65 signature.
pub fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<()> {
    let pk_bytes: [u8; PUBLIC_KEY_LEN] = public_key.try_into().map_err(|_| {
        DidError::InvalidKey(format!(
            "ML-DSA-65 public key must be {PUBLIC_KEY_LEN} bytes, got {}",
            public_key.len()
        ))
    })?;
    let pk = ml_dsa_65::PublicKey::try_from_bytes(pk_bytes)
        .map_err(|e| DidError::InvalidKey(format!("invalid ML-DSA-65 public key: {e}")))?;
    let sig: [u8; SIGNATURE_LEN] = signature.try_into().map_err(|_| {
        DidError::CryptoVerificationFailure(format!(
            "ML-DSA-65 signature must be {SIGNATURE_LEN} bytes, got {}",
            signature.len()
        ))
    })?;

    if pk.verify(message, &sig, &[]) {
        Ok(())
    } else {
        Err(DidError::CryptoVerificationFailure(
            "ML-DSA-65 signature does not verify".into(),
        ))
    }
}
