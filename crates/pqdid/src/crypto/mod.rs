//! Signing capabilities for the two anchoring rails.
//!
//! - ML-DSA-65 for the post-quantum attestation over core bytes
//! - ES256 for the classical proof over the core's CID, in software or
//!   through an external signer

pub mod es256;
pub mod mldsa;

pub use es256::{ClassicalSigner, ExternalSigner};
pub use mldsa::MlDsaKeyPair;
