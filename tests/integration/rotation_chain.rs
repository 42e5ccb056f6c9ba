//! Integration test: multi-step rotation chains.

use pqdid::{
    create, verify_document, verify_rotation_chain, DidError, DocumentBuilder, IdentityDocument,
    RotationLog, RotationRegistry, SoftwareKeys,
};

fn assert_valid(doc: &IdentityDocument) {
    let stored = doc.canonical_bytes().unwrap();
    let result = verify_document(doc, &stored);
    assert!(
        result.is_valid,
        "sequence {} errors: {:?}",
        doc.sequence, result.errors
    );
}

#[test]
fn five_rotations_with_fresh_keys() {
    let genesis_keys = SoftwareKeys::generate().unwrap();
    let did = genesis_keys.did();
    let mut chain = vec![create(&did, &genesis_keys.to_key_material(), &[], &[], &[]).unwrap()];

    for _ in 0..5 {
        let keys = SoftwareKeys::generate().unwrap();
        let previous = chain.last().unwrap();
        let next = DocumentBuilder::new(&did)
            .succeeding(previous)
            .sign(&keys.to_key_material())
            .unwrap();
        chain.push(next);
    }

    for (i, doc) in chain.iter().enumerate() {
        assert_eq!(doc.sequence, i as u64 + 1);
        assert_eq!(doc.key_history.len(), i);
        assert_valid(doc);
    }
    verify_rotation_chain(&chain).unwrap();

    // Every earlier core is in the final history, oldest first.
    let last = chain.last().unwrap();
    let earlier: Vec<String> = chain[..chain.len() - 1]
        .iter()
        .map(|d| d.current_core.clone())
        .collect();
    assert_eq!(last.key_history, earlier);
}

#[test]
fn skipped_version_breaks_chain() {
    let keys = SoftwareKeys::generate().unwrap();
    let did = keys.did();
    let material = keys.to_key_material();
    let d1 = create(&did, &material, &[], &[], &[]).unwrap();
    let d2 = create(&did, &material, &d1.successor_history(), &[], &[]).unwrap();
    let d3 = create(&did, &material, &d2.successor_history(), &[], &[]).unwrap();

    let err = verify_rotation_chain(&[d1, d3]).unwrap_err();
    assert!(matches!(err, DidError::StructuralViolation(_)));
}

#[test]
fn forked_history_is_rejected_by_log() {
    let keys = SoftwareKeys::generate().unwrap();
    let did = keys.did();
    let material = keys.to_key_material();

    let genesis = create(&did, &material, &[], &[], &[]).unwrap();
    let mut log = RotationLog::from_document(&genesis);
    assert_eq!(log.sequence(), 1);

    let prior = log.next_prior_history();
    let branch_a = create(&did, &material, &prior, &[], &[]).unwrap();
    let branch_b = create(
        &did,
        &SoftwareKeys::generate().unwrap().to_key_material(),
        &prior,
        &[],
        &[],
    )
    .unwrap();

    // Both branches are individually valid documents.
    assert_valid(&branch_a);
    assert_valid(&branch_b);

    log.commit(&branch_a).unwrap();
    let err = log.commit(&branch_b).unwrap_err();
    assert!(matches!(err, DidError::StructuralViolation(_)));
    assert_eq!(log.head(), Some(branch_a.current_core.as_str()));
}

#[test]
fn registry_tracks_independent_identifiers() {
    let registry = RotationRegistry::new();
    let alice = SoftwareKeys::generate().unwrap();
    let bob = SoftwareKeys::generate().unwrap();
    let (alice_did, bob_did) = (alice.did(), bob.did());
    let (alice_keys, bob_keys) = (alice.to_key_material(), bob.to_key_material());

    for _ in 0..3 {
        registry
            .rotate(&alice_did, |prior| create(&alice_did, &alice_keys, prior, &[], &[]))
            .unwrap();
    }
    registry
        .rotate(&bob_did, |prior| create(&bob_did, &bob_keys, prior, &[], &[]))
        .unwrap();

    assert_eq!(registry.sequence(&alice_did).unwrap(), 3);
    assert_eq!(registry.sequence(&bob_did).unwrap(), 1);
}
