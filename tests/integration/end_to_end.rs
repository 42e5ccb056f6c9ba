//! Integration test: document lifecycle from creation to rotation.
//!
//! Covers:
//! 1. Genesis document verifies
//! 2. Rotation links back to the previous core and verifies
//! 3. A reordered stored blob is a canonical mismatch only
//! 4. A proof over the wrong CID fails the proof stage
//! 5. External (hardware-style) classical signer

use std::sync::Arc;

use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use rand::rngs::OsRng;

use pqdid::anchor::proof;
use pqdid::crypto::es256;
use pqdid::{
    compute_cid, create, verify_document, ClassicalSigner, DidError, DocumentBuilder,
    ExternalSigner, Service, SoftwareKeys,
};

#[test]
fn scenario_genesis_document_verifies() {
    let keys = SoftwareKeys::generate().expect("key generation");
    let doc = create(&keys.did(), &keys.to_key_material(), &[], &[], &[]).expect("create");
    let stored = doc.canonical_bytes().expect("canonical bytes");

    let result = verify_document(&doc, &stored);
    assert!(result.is_valid, "errors: {:?}", result.errors);
    assert_eq!(doc.sequence, 1);
    assert!(doc.prev.is_none());
    assert!(doc.key_history.is_empty());
}

#[test]
fn scenario_rotation_links_to_previous_core() {
    let keys = SoftwareKeys::generate().unwrap();
    let did = keys.did();
    let first = create(&did, &keys.to_key_material(), &[], &[], &[]).unwrap();

    // ── Rotate onto fresh keys under the same identifier ──────────────────
    let next_keys = SoftwareKeys::generate().unwrap();
    let prior = vec![first.current_core.clone()];
    let second = create(&did, &next_keys.to_key_material(), &prior, &[], &[]).unwrap();

    assert_eq!(second.sequence, 2);
    assert_eq!(second.prev.as_deref(), Some(first.current_core.as_str()));
    assert!(second.key_history.contains(&first.current_core));
    assert!(!second.key_history.contains(&second.current_core));
    assert_ne!(second.current_core, first.current_core);

    let stored = second.canonical_bytes().unwrap();
    let result = verify_document(&second, &stored);
    assert!(result.is_valid, "errors: {:?}", result.errors);
}

#[test]
fn scenario_reordered_blob_is_canonical_mismatch() {
    let keys = SoftwareKeys::generate().unwrap();
    let doc = create(&keys.did(), &keys.to_key_material(), &[], &[], &[]).unwrap();

    // Struct field order instead of sorted keys.
    let reordered = serde_json::to_vec(&doc).unwrap();
    assert_ne!(reordered, doc.canonical_bytes().unwrap());

    let result = verify_document(&doc, &reordered);
    assert!(!result.is_valid);
    assert!(!result.canonical_valid);
    assert!(result.structure_valid);
    assert!(result.attestation_valid);
    assert!(result.proof_valid);
    assert_eq!(result.errors.len(), 1);
    assert!(matches!(
        result.errors[0],
        DidError::CanonicalMismatch { .. }
    ));
}

#[test]
fn scenario_proof_over_wrong_cid_fails() {
    let keys = SoftwareKeys::generate().unwrap();
    let material = keys.to_key_material();
    let mut doc = create(&keys.did(), &material, &[], &[], &[]).unwrap();

    let other = compute_cid(b"some other core");
    doc.proof = proof::sign(
        &other,
        material.signer().unwrap(),
        &doc.proof.verification_method,
    )
    .unwrap();
    let stored = doc.canonical_bytes().unwrap();

    let result = verify_document(&doc, &stored);
    assert!(!result.is_valid);
    assert!(!result.proof_valid);
    assert!(result.attestation_valid);
    assert!(result.errors.iter().any(|e| matches!(
        e,
        DidError::CryptoVerificationFailure(msg) if msg.contains("payload does not match currentCore")
    )));
}

struct DeviceSigner {
    key: SigningKey,
}

impl ExternalSigner for DeviceSigner {
    fn sign(&self, message: &[u8]) -> pqdid::Result<Vec<u8>> {
        let signature: Signature = self.key.sign(message);
        Ok(signature.to_der().as_bytes().to_vec())
    }

    fn label(&self) -> &str {
        "device"
    }
}

#[test]
fn external_signer_produces_valid_document() {
    let keys = SoftwareKeys::generate().unwrap();
    let device_key = SigningKey::random(&mut OsRng);

    let mut material = keys.to_key_material();
    material.classical_public = es256::public_key_bytes(&device_key);
    let material = material.with_classical_signer(Some(ClassicalSigner::External(Arc::new(
        DeviceSigner { key: device_key },
    ))));

    let doc = DocumentBuilder::new(keys.did())
        .service(Service::new(
            format!("{}#messaging", keys.did()),
            "MessagingService",
            "https://relay.example.com",
        ))
        .alias("https://example.com/users/alice")
        .sign(&material)
        .unwrap();

    let stored = doc.canonical_bytes().unwrap();
    let result = verify_document(&doc, &stored);
    assert!(result.is_valid, "errors: {:?}", result.errors);
}

struct LockedDevice;

impl ExternalSigner for LockedDevice {
    fn sign(&self, _message: &[u8]) -> pqdid::Result<Vec<u8>> {
        Err(DidError::SignerFailure("user cancelled".into()))
    }
}

#[test]
fn external_signer_failure_propagates() {
    let keys = SoftwareKeys::generate().unwrap();
    let material = keys
        .to_key_material()
        .with_classical_signer(Some(ClassicalSigner::External(Arc::new(LockedDevice))));

    let err = create(&keys.did(), &material, &[], &[], &[]).unwrap_err();
    assert_eq!(err, DidError::SignerFailure("user cancelled".into()));
}

#[test]
fn document_survives_json_round_trip() {
    let keys = SoftwareKeys::generate().unwrap();
    let doc = create(
        &keys.did(),
        &keys.to_key_material(),
        &[],
        &[Service::new("#hub", "Hub", "https://hub.example")],
        &["https://example.com/bob".to_string()],
    )
    .unwrap();

    let json = doc.to_json_pretty().unwrap();
    let stored = doc.canonical_bytes().unwrap();
    let parsed = pqdid::IdentityDocument::from_json(&json).unwrap();
    assert!(verify_document(&parsed, &stored).is_valid);
}
