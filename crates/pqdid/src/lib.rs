//! pqdid: content-addressed DID documents with dual-rail anchoring.
//!
//! Each document version embeds a canonically encoded core whose CID it
//! declares. The core is attested with ML-DSA-65 and its CID is signed with
//! ES256. Verification requires both rails, so forging a document means
//! breaking both signature families.
//! Rotations chain cores through `prev` and `keyHistory`.

pub mod anchor;
pub mod canonical;
pub mod cid;
pub mod crypto;
pub mod document;
pub mod encoding;
pub mod error;
pub mod keys;
pub mod method;
pub mod multikey;
pub mod rotation;
pub mod time;
pub mod verify;

// Re-export primary types
pub use anchor::{Attestation, Proof};
pub use canonical::{canonicalize, canonicalize_serializable, CoreValue};
pub use cid::{compute_cid, encode_core, parse_cid, ParsedCid};
pub use crypto::{ClassicalSigner, ExternalSigner};
pub use document::{
    create, CoreObject, DocumentBuilder, IdentityDocument, Service, UpdatePolicy,
    VerificationMethod,
};
pub use error::{DidError, Result};
pub use keys::{BlockchainKey, KeyMaterial, SoftwareKeys};
pub use multikey::{decode_key, encode_key, Codec};
pub use rotation::{verify_rotation_chain, RotationLog, RotationRegistry};
pub use verify::{
    verify_document, verify_document_with, ContextPolicy, DocumentVerification, VerifyOptions,
};
