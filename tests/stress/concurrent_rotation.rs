//! Concurrency test: parallel rotations through the registry.
//!
//! Rotations of one identifier must serialize into a single unbroken chain;
//! rotations of different identifiers must not interfere.

use std::sync::{Arc, Mutex};
use std::thread;

use pqdid::{
    create, verify_document, verify_rotation_chain, IdentityDocument, KeyMaterial, RotationLog,
    RotationRegistry, SoftwareKeys,
};

#[test]
fn stress_8_threads_rotate_one_identifier() {
    let keys = SoftwareKeys::generate().unwrap();
    let did = Arc::new(keys.did());
    let material = Arc::new(keys.to_key_material());
    let registry = Arc::new(RotationRegistry::new());
    let produced = Arc::new(Mutex::new(Vec::new()));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let (did, material) = (Arc::clone(&did), Arc::clone(&material));
        let registry = Arc::clone(&registry);
        let produced = Arc::clone(&produced);
        handles.push(thread::spawn(move || {
            for _ in 0..3 {
                let doc = registry
                    .rotate(&did, |prior| create(&did, &material, prior, &[], &[]))
                    .expect("rotation should succeed");
                produced.lock().unwrap().push(doc);
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    let mut docs: Vec<IdentityDocument> = produced.lock().unwrap().clone();
    assert_eq!(docs.len(), 24);
    assert_eq!(registry.sequence(&did).unwrap(), 24);

    docs.sort_by_key(|d| d.sequence);
    for (i, doc) in docs.iter().enumerate() {
        assert_eq!(doc.sequence, i as u64 + 1, "sequence gap at {i}");
    }
    verify_rotation_chain(&docs).expect("serialized rotations form one chain");
    assert_eq!(
        registry.head(&did).unwrap().as_deref(),
        Some(docs.last().unwrap().current_core.as_str())
    );
}

#[test]
fn stress_independent_identifiers_in_parallel() {
    let registry = Arc::new(RotationRegistry::new());
    let identities: Vec<(String, KeyMaterial)> = (0..6)
        .map(|_| {
            let keys = SoftwareKeys::generate().unwrap();
            (keys.did(), keys.to_key_material())
        })
        .collect();

    let mut handles = Vec::new();
    for (did, material) in identities.clone() {
        let registry = Arc::clone(&registry);
        handles.push(thread::spawn(move || {
            let mut chain = Vec::new();
            for _ in 0..4 {
                chain.push(
                    registry
                        .rotate(&did, |prior| create(&did, &material, prior, &[], &[]))
                        .unwrap(),
                );
            }
            chain
        }));
    }

    for h in handles {
        let chain = h.join().unwrap();
        assert_eq!(chain.len(), 4);
        verify_rotation_chain(&chain).unwrap();
        let last = chain.last().unwrap();
        let stored = last.canonical_bytes().unwrap();
        assert!(verify_document(last, &stored).is_valid);
    }
    for (did, _) in &identities {
        assert_eq!(registry.sequence(did).unwrap(), 4);
    }
}

#[test]
fn stress_unserialized_writers_are_detected() {
    let keys = SoftwareKeys::generate().unwrap();
    let did = keys.did();
    let material = Arc::new(keys.to_key_material());
    let genesis = create(&did, &material, &[], &[], &[]).unwrap();
    let log = Arc::new(Mutex::new(RotationLog::from_document(&genesis)));

    // Every writer reads the same head, then races to commit.
    let prior = log.lock().unwrap().next_prior_history();
    let mut handles = Vec::new();
    for _ in 0..6 {
        let (did, material, prior) = (did.clone(), Arc::clone(&material), prior.clone());
        let log = Arc::clone(&log);
        handles.push(thread::spawn(move || {
            let doc = create(&did, &material, &prior, &[], &[]).unwrap();
            log.lock().unwrap().commit(&doc).is_ok()
        }));
    }

    let committed = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();
    assert_eq!(committed, 1, "exactly one stale writer may win");
    assert_eq!(log.lock().unwrap().sequence(), 2);
}
