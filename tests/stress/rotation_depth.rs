//! Stress test: long rotation chains keep every invariant.

use pqdid::{verify_document, verify_rotation_chain, DocumentBuilder, RotationLog, SoftwareKeys};

#[test]
fn stress_chain_of_40_rotations() {
    let keys = SoftwareKeys::generate().unwrap();
    let did = keys.did();
    let material = keys.to_key_material();
    let mut log = RotationLog::new(&did);
    let mut chain = Vec::with_capacity(40);

    for _ in 0..40 {
        let doc = DocumentBuilder::new(&did)
            .prior_history(log.next_prior_history())
            .sign(&material)
            .expect("creation should succeed");
        log.commit(&doc).expect("commit should succeed");
        chain.push(doc);
    }

    assert_eq!(log.sequence(), 40);
    verify_rotation_chain(&chain).unwrap();

    let last = chain.last().unwrap();
    assert_eq!(last.key_history.len(), 39);
    assert_eq!(last.prev.as_deref(), last.key_history.last().map(String::as_str));

    let stored = last.canonical_bytes().unwrap();
    let result = verify_document(last, &stored);
    assert!(result.is_valid, "errors: {:?}", result.errors);
}

#[test]
fn stress_every_link_in_chain_verifies() {
    let mut chain = Vec::new();
    let did = SoftwareKeys::generate().unwrap().did();
    for _ in 0..12 {
        // New key set each time, same identifier.
        let material = SoftwareKeys::generate().unwrap().to_key_material();
        let builder = DocumentBuilder::new(&did);
        let builder = match chain.last() {
            Some(previous) => builder.succeeding(previous),
            None => builder,
        };
        chain.push(builder.sign(&material).unwrap());
    }

    for (i, doc) in chain.iter().enumerate() {
        let stored = doc.canonical_bytes().unwrap();
        let result = verify_document(doc, &stored);
        assert!(result.is_valid, "link {i} errors: {:?}", result.errors);
    }
    verify_rotation_chain(&chain).unwrap();

    // Cores are unique across the chain.
    let mut cores: Vec<&str> = chain.iter().map(|d| d.current_core.as_str()).collect();
    cores.sort_unstable();
    cores.dedup();
    assert_eq!(cores.len(), chain.len());
}
