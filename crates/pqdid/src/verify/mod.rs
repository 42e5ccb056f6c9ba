//! Document verification.
//!
//! Four stages, always all of them, with errors accumulated:
//! 1. Structure (identity, rotation chain, methods, roles, anchors, core binding)
//! 2. Canonical form (re-encoding reproduces the stored bytes)
//! 3. Attestation (ML-DSA-65 over `coreCbor` with `#pq-root`)
//! 4. Proof (ES256 JWS over `currentCore` with `#es256`)

mod structural;

use crate::canonical::canonicalize_serializable;
use crate::document::IdentityDocument;
use crate::error::{DidError, Result};
use crate::method::{self, vm_id};
use crate::multikey::{self, Codec};

/// How the `@context` list is matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContextPolicy {
    /// The list must equal the required contexts, in order.
    #[default]
    Exact,
    /// The required contexts come first, in order; others may follow.
    RequiredPrefix,
}

/// Verifier configuration.
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    pub context_policy: ContextPolicy,
}

impl VerifyOptions {
    /// Accept additional contexts after the required ones.
    pub fn allow_extra_contexts(mut self) -> Self {
        self.context_policy = ContextPolicy::RequiredPrefix;
        self
    }
}

/// Result of verifying a document.
#[derive(Debug, Clone)]
pub struct DocumentVerification {
    /// Do all structural rules hold?
    pub structure_valid: bool,
    /// Does the document re-encode to the stored canonical bytes?
    pub canonical_valid: bool,
    /// Does the post-quantum attestation verify?
    pub attestation_valid: bool,
    /// Does the classical proof verify?
    pub proof_valid: bool,
    /// All four stages passed.
    pub is_valid: bool,
    /// Every failure found, in stage order.
    pub errors: Vec<DidError>,
    /// Verification timestamp.
    pub verified_at: u64,
}

impl DocumentVerification {
    /// Errors of one kind, e.g. `"StructuralViolation"`.
    pub fn errors_of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a DidError> {
        self.errors.iter().filter(move |e| e.kind() == kind)
    }
}

/// Verify a document against its stored canonical bytes, default options.
pub fn verify_document(doc: &IdentityDocument, stored_canonical: &[u8]) -> DocumentVerification {
    verify_document_with(doc, stored_canonical, &VerifyOptions::default())
}

/// Verify a document against its stored canonical bytes.
pub fn verify_document_with(
    doc: &IdentityDocument,
    stored_canonical: &[u8],
    options: &VerifyOptions,
) -> DocumentVerification {
    let now = crate::time::now_micros();
    let mut errors = Vec::new();

    // 1. Structure
    let structural = structural::check(doc, options);
    let structure_valid = structural.is_empty();
    errors.extend(structural);

    // 2. Canonical form
    let canonical_valid = record(&mut errors, check_canonical(doc, stored_canonical));

    // 3. Attestation
    let attestation_valid = record(&mut errors, check_attestation(doc));

    // 4. Proof
    let proof_valid = record(&mut errors, check_proof(doc));

    let is_valid = structure_valid && canonical_valid && attestation_valid && proof_valid;
    log::debug!(
        "verified {}: structure={structure_valid} canonical={canonical_valid} \
         attestation={attestation_valid} proof={proof_valid}",
        doc.id
    );

    DocumentVerification {
        structure_valid,
        canonical_valid,
        attestation_valid,
        proof_valid,
        is_valid,
        errors,
        verified_at: now,
    }
}

/// Quick check: does the document pass every stage?
pub fn is_document_valid(doc: &IdentityDocument, stored_canonical: &[u8]) -> bool {
    verify_document(doc, stored_canonical).is_valid
}

fn record(errors: &mut Vec<DidError>, outcome: Result<()>) -> bool {
    match outcome {
        Ok(()) => true,
        Err(e) => {
            errors.push(e);
            false
        }
    }
}

fn check_canonical(doc: &IdentityDocument, stored: &[u8]) -> Result<()> {
    let computed = canonicalize_serializable(doc)?;
    if computed != stored {
        return Err(DidError::CanonicalMismatch {
            stored_len: stored.len(),
            computed_len: computed.len(),
        });
    }
    Ok(())
}

fn declared_key(doc: &IdentityDocument, fragment: &str, codec: Codec) -> Result<Vec<u8>> {
    let id = vm_id(&doc.id, fragment);
    let vm = doc.verification_method(&id).ok_or_else(|| {
        DidError::CryptoVerificationFailure(format!("no {id} key to verify against"))
    })?;
    multikey::decode_key_expecting(codec, &vm.public_key_multibase)
}

fn check_attestation(doc: &IdentityDocument) -> Result<()> {
    let public_key = declared_key(doc, method::FRAGMENT_PQ_ROOT, Codec::MlDsa65)?;
    let core_bytes = doc.core_bytes()?;
    let attestation = doc
        .attestations
        .first()
        .ok_or_else(|| DidError::CryptoVerificationFailure("no attestation present".into()))?;
    attestation.verify(&core_bytes, &public_key)
}

fn check_proof(doc: &IdentityDocument) -> Result<()> {
    let public_key = declared_key(doc, method::FRAGMENT_ES256, Codec::P256)?;
    doc.proof.verify(&doc.current_core, &public_key)
}
