//! Key material consumed by the document generator.
//!
//! [`KeyMaterial`] is the boundary with whatever owns the private keys: it
//! carries every public key the document declares, the root ML-DSA secret
//! for the attestation, and the signer for the classical proof.
//! [`SoftwareKeys`] is an in-process provider that generates all of it.

use std::fmt;

use fips203::ml_kem_768;
use fips203::traits::{KeyGen, SerDes};
use rand::rngs::OsRng;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::crypto::es256::{self, ClassicalSigner};
use crate::crypto::mldsa::MlDsaKeyPair;
use crate::error::{DidError, Result};
use crate::method;
use crate::multikey::Codec;

/// An optional additional key for a blockchain account.
///
/// Declared as `<did>#<chain>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockchainKey {
    pub chain: String,
    pub codec: Codec,
    pub public_key: Vec<u8>,
}

/// Public keys and signing capabilities for one document version.
#[derive(Clone)]
pub struct KeyMaterial {
    pub pq_root_public: Vec<u8>,
    pub pq_root_secret: Zeroizing<Vec<u8>>,
    pub pq_auth_public: Vec<u8>,
    /// SEC1 P-256 public key for `#es256`.
    pub classical_public: Vec<u8>,
    pub classical_signer: Option<ClassicalSigner>,
    pub kem_public: Vec<u8>,
    pub ed25519_public: Vec<u8>,
    pub x25519_public: Vec<u8>,
    pub blockchain_keys: Vec<BlockchainKey>,
}

impl KeyMaterial {
    /// Replace the classical signer, e.g. with an external handle.
    pub fn with_classical_signer(mut self, signer: Option<ClassicalSigner>) -> Self {
        self.classical_signer = signer;
        self
    }

    /// The classical signer, or `SignatureUnavailable`.
    pub fn signer(&self) -> Result<&ClassicalSigner> {
        self.classical_signer
            .as_ref()
            .ok_or(DidError::SignatureUnavailable)
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("pq_root_public_len", &self.pq_root_public.len())
            .field("classical_signer", &self.classical_signer)
            .field("blockchain_keys", &self.blockchain_keys)
            .finish_non_exhaustive()
    }
}

enum BlockchainSecret {
    Secp256k1(k256::ecdsa::SigningKey),
    Ed25519(ed25519_dalek::SigningKey),
}

/// All private keys for one document version, held in memory.
///
/// Secret halves are zeroized on drop.
pub struct SoftwareKeys {
    pq_root: MlDsaKeyPair,
    pq_auth: MlDsaKeyPair,
    es256: p256::ecdsa::SigningKey,
    kem_public: Vec<u8>,
    kem_secret: Zeroizing<Vec<u8>>,
    ed25519: ed25519_dalek::SigningKey,
    x25519: StaticSecret,
    blockchain: Vec<(String, BlockchainSecret)>,
}

impl SoftwareKeys {
    /// Generate a full set of fresh keys.
    pub fn generate() -> Result<Self> {
        let pq_root = MlDsaKeyPair::generate()?;
        let pq_auth = MlDsaKeyPair::generate()?;
        let (ek, dk) = ml_kem_768::KG::try_keygen()
            .map_err(|e| DidError::InvalidKey(format!("ML-KEM-768 key generation failed: {e}")))?;

        log::debug!("generated software key set");
        Ok(Self {
            pq_root,
            pq_auth,
            es256: p256::ecdsa::SigningKey::random(&mut OsRng),
            kem_public: ek.into_bytes().to_vec(),
            kem_secret: Zeroizing::new(dk.into_bytes().to_vec()),
            ed25519: ed25519_dalek::SigningKey::generate(&mut OsRng),
            x25519: StaticSecret::random_from_rng(OsRng),
            blockchain: Vec::new(),
        })
    }

    /// Add a blockchain account key (secp256k1 or Ed25519).
    pub fn with_blockchain_key(mut self, chain: &str, codec: Codec) -> Result<Self> {
        if chain.is_empty() || method::REQUIRED_FRAGMENTS.contains(&chain) {
            return Err(DidError::InvalidKey(format!(
                "chain name {chain:?} is empty or reserved"
            )));
        }
        let secret = match codec {
            Codec::Secp256k1 => BlockchainSecret::Secp256k1(k256::ecdsa::SigningKey::random(&mut OsRng)),
            Codec::Ed25519 => BlockchainSecret::Ed25519(ed25519_dalek::SigningKey::generate(&mut OsRng)),
            other => {
                return Err(DidError::InvalidKey(format!(
                    "{} is not a supported blockchain key type",
                    other.algorithm()
                )))
            }
        };
        self.blockchain.push((chain.to_string(), secret));
        Ok(self)
    }

    /// The identifier derived from the root public key.
    pub fn did(&self) -> String {
        method::did_from_root_key(self.pq_root.public_key_bytes())
    }

    pub fn pq_root(&self) -> &MlDsaKeyPair {
        &self.pq_root
    }

    pub fn pq_auth(&self) -> &MlDsaKeyPair {
        &self.pq_auth
    }

    pub fn es256_signing_key(&self) -> &p256::ecdsa::SigningKey {
        &self.es256
    }

    /// Encoded ML-KEM-768 decapsulation key.
    pub fn kem_secret_bytes(&self) -> &[u8] {
        &self.kem_secret
    }

    /// Public keys plus a software classical signer.
    pub fn to_key_material(&self) -> KeyMaterial {
        let blockchain_keys = self
            .blockchain
            .iter()
            .map(|(chain, secret)| match secret {
                BlockchainSecret::Secp256k1(key) => BlockchainKey {
                    chain: chain.clone(),
                    codec: Codec::Secp256k1,
                    public_key: key
                        .verifying_key()
                        .to_encoded_point(true)
                        .as_bytes()
                        .to_vec(),
                },
                BlockchainSecret::Ed25519(key) => BlockchainKey {
                    chain: chain.clone(),
                    codec: Codec::Ed25519,
                    public_key: key.verifying_key().to_bytes().to_vec(),
                },
            })
            .collect();

        KeyMaterial {
            pq_root_public: self.pq_root.public_key_bytes().to_vec(),
            pq_root_secret: Zeroizing::new(self.pq_root.secret_key_bytes().to_vec()),
            pq_auth_public: self.pq_auth.public_key_bytes().to_vec(),
            classical_public: es256::public_key_bytes(&self.es256),
            classical_signer: Some(ClassicalSigner::Software(self.es256.clone())),
            kem_public: self.kem_public.clone(),
            ed25519_public: self.ed25519.verifying_key().to_bytes().to_vec(),
            x25519_public: X25519PublicKey::from(&self.x25519).as_bytes().to_vec(),
            blockchain_keys,
        }
    }
}

impl fmt::Debug for SoftwareKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftwareKeys")
            .field("did", &self.did())
            .field("blockchain_keys", &self.blockchain.len())
            .finish_non_exhaustive()
    }
}
