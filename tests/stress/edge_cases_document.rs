//! Edge cases: hostile or degenerate documents must be reported, never
//! panic, and never pass.

use pqdid::encoding::multibase::{self, Base};
use pqdid::{
    canonicalize, create, verify_document, verify_rotation_chain, DidError, IdentityDocument,
    Service, SoftwareKeys,
};

fn fresh() -> IdentityDocument {
    let keys = SoftwareKeys::generate().unwrap();
    create(&keys.did(), &keys.to_key_material(), &[], &[], &[]).unwrap()
}

fn verify_mutated(mutate: impl FnOnce(&mut IdentityDocument)) -> pqdid::DocumentVerification {
    let mut doc = fresh();
    mutate(&mut doc);
    let stored = doc.canonical_bytes().unwrap();
    verify_document(&doc, &stored)
}

#[test]
fn edge_garbage_core_cbor() {
    let cases: Vec<String> = vec![
        "u".into(),
        "uAAAA".into(),
        "not multibase at all".into(),
        "zabc".into(),
        multibase::encode(Base::Base64Url, &[0xff; 64]),
        multibase::encode(Base::Base64Url, &[0x9f, 0x01, 0xff]),
        multibase::encode(Base::Base64Url, &[0xbf; 200]),
    ];
    for case in cases {
        let result = verify_mutated(|doc| doc.core_cbor = case.clone());
        assert!(!result.is_valid, "accepted coreCbor {case:?}");
        assert!(!result.structure_valid);
        assert!(!result.attestation_valid);
    }
}

#[test]
fn edge_deeply_nested_core_is_rejected() {
    // 10_000 nested single-element lists.
    let mut bytes = vec![0x81; 10_000];
    bytes.push(0x00);
    let result = verify_mutated(|doc| doc.core_cbor = multibase::encode(Base::Base64Url, &bytes));
    assert!(!result.is_valid);
}

#[test]
fn edge_extreme_sequence_values() {
    for sequence in [0, u64::MAX, u32::MAX as u64 + 1] {
        let result = verify_mutated(|doc| doc.sequence = sequence);
        assert!(!result.is_valid, "accepted sequence {sequence}");
        assert!(!result.structure_valid);
    }
}

#[test]
fn edge_rotation_chain_with_maximal_sequence() {
    let keys = SoftwareKeys::generate().unwrap();
    let material = keys.to_key_material();
    let mut first = create(&keys.did(), &material, &[], &[], &[]).unwrap();
    let mut second = create(&keys.did(), &material, &first.successor_history(), &[], &[]).unwrap();

    first.sequence = u64::MAX;
    assert!(matches!(
        verify_rotation_chain(&[first.clone(), second.clone()]),
        Err(DidError::StructuralViolation(_))
    ));

    // Wrapping around to 0 is not a successor either.
    second.sequence = 0;
    assert!(matches!(
        verify_rotation_chain(&[first, second]),
        Err(DidError::StructuralViolation(_))
    ));
}

#[test]
fn edge_mangled_jws() {
    let cases = [
        "",
        "..",
        "a.b.c",
        "eyJhbGciOiJFUzI1NiJ9..",
        "eyJhbGciOiJFUzI1NiJ9.YmFmeQ.AAAA",
        "eyJhbGciOiJub25lIn0.YmFmeQ.",
    ];
    for case in cases {
        let result = verify_mutated(|doc| doc.proof.jws = case.to_string());
        assert!(!result.proof_valid, "accepted jws {case:?}");
        assert!(!result.is_valid);
    }
}

#[test]
fn edge_mangled_attestation_signature() {
    let cases = ["", "!!!!", "AAAA", "ZZZZZZZZZZZZZZZZ"];
    for case in cases {
        let result = verify_mutated(|doc| doc.attestations[0].sig = case.to_string());
        assert!(!result.attestation_valid, "accepted sig {case:?}");
    }
}

#[test]
fn edge_empty_verification_methods() {
    let result = verify_mutated(|doc| doc.verification_method.clear());
    assert!(!result.is_valid);
    assert!(!result.attestation_valid);
    assert!(!result.proof_valid);
    let missing = result
        .errors
        .iter()
        .filter(|e| matches!(e, DidError::StructuralViolation(m) if m.contains("is missing")))
        .count();
    assert_eq!(missing, 6);
}

#[test]
fn edge_duplicate_verification_method() {
    let result = verify_mutated(|doc| {
        let dup = doc.verification_method[0].clone();
        doc.verification_method.push(dup);
    });
    assert!(!result.structure_valid);
    assert!(result
        .errors
        .iter()
        .any(|e| e.to_string().contains("declared twice")));
}

#[test]
fn edge_unicode_services_and_aliases() {
    let keys = SoftwareKeys::generate().unwrap();
    let doc = create(
        &keys.did(),
        &keys.to_key_material(),
        &[],
        &[Service::new(
            "#ñandú-\u{1F600}",
            "Servicio \"citado\"\n",
            "https://例え.jp/パス?q=\u{7}",
        )],
        &["https://example.com/\u{2028}alias".to_string()],
    )
    .unwrap();
    let stored = doc.canonical_bytes().unwrap();
    let result = verify_document(&doc, &stored);
    assert!(result.is_valid, "errors: {:?}", result.errors);

    // The stored bytes equal canonicalization of the parsed JSON as well.
    let reparsed: serde_json::Value = serde_json::from_slice(&stored).unwrap();
    assert_eq!(canonicalize(&reparsed).unwrap(), stored);
}

#[test]
fn edge_empty_stored_canonical() {
    let doc = fresh();
    let result = verify_document(&doc, &[]);
    assert!(!result.canonical_valid);
    assert!(matches!(
        result.errors[0],
        DidError::CanonicalMismatch { stored_len: 0, .. }
    ));
}

#[test]
fn edge_document_from_malformed_json() {
    for json in ["", "{}", "[]", r#"{"id": 5}"#, "null"] {
        assert!(matches!(
            IdentityDocument::from_json(json),
            Err(DidError::Serialization(_))
        ));
    }
}
