//! Structural checks, including the binding between `coreCbor` and the
//! document that carries it.
//!
//! Every rule that fails contributes its own error; nothing short-circuits.

use std::collections::HashSet;

use crate::cid;
use crate::document::{CoreObject, IdentityDocument};
use crate::error::DidError;
use crate::method::{self, vm_id};
use crate::multikey::{self, Codec};

use super::{ContextPolicy, VerifyOptions};

/// Run every structural rule, returning all violations.
pub(crate) fn check(doc: &IdentityDocument, options: &VerifyOptions) -> Vec<DidError> {
    let mut errors = Vec::new();
    check_identity(doc, options, &mut errors);
    check_chain(doc, &mut errors);
    check_methods(doc, &mut errors);
    check_roles(doc, &mut errors);
    check_anchors(doc, &mut errors);
    check_core_binding(doc, &mut errors);
    errors
}

fn fail(errors: &mut Vec<DidError>, msg: impl Into<String>) {
    errors.push(DidError::structural(msg));
}

fn check_identity(doc: &IdentityDocument, options: &VerifyOptions, errors: &mut Vec<DidError>) {
    let required = method::REQUIRED_CONTEXTS;
    let context_ok = match options.context_policy {
        ContextPolicy::Exact => doc.context.iter().map(String::as_str).eq(required),
        ContextPolicy::RequiredPrefix => {
            doc.context.len() >= required.len()
                && doc.context.iter().zip(required).all(|(have, want)| have == want)
        }
    };
    if !context_ok {
        fail(
            errors,
            format!("@context {:?} does not match the required contexts", doc.context),
        );
    }

    if let Err(e) = method::validate_did(&doc.id) {
        errors.push(e);
    }
    if doc.controller != doc.id {
        fail(
            errors,
            format!("controller {} differs from id {}", doc.controller, doc.id),
        );
    }
    if doc.core_cbor.is_empty() {
        fail(errors, "coreCbor is empty");
    }
}

fn check_chain(doc: &IdentityDocument, errors: &mut Vec<DidError>) {
    let history_len = doc.key_history.len() as u64;

    if doc.sequence == 0 {
        fail(errors, "sequence must be at least 1");
    }
    if doc.sequence != history_len + 1 {
        fail(
            errors,
            format!(
                "sequence {} does not equal keyHistory length {} + 1",
                doc.sequence, history_len
            ),
        );
    }
    if doc.sequence == 1 && doc.prev.is_some() {
        fail(errors, "sequence 1 must not carry prev");
    }
    if doc.sequence == 1 && !doc.key_history.is_empty() {
        fail(errors, "sequence 1 must have an empty keyHistory");
    }
    if doc.sequence > 1 && doc.prev.is_none() {
        fail(errors, format!("sequence {} is missing prev", doc.sequence));
    }
    if let Some(prev) = &doc.prev {
        if doc.key_history.last() != Some(prev) {
            fail(errors, format!("prev {prev} is not the last keyHistory entry"));
        }
    }
    if doc.key_history.contains(&doc.current_core) {
        fail(errors, "keyHistory contains currentCore");
    }

    let mut seen = HashSet::new();
    for entry in &doc.key_history {
        if let Err(e) = cid::parse_cid(entry) {
            fail(errors, format!("keyHistory entry {entry:?} is not a CID: {e}"));
        }
        if !seen.insert(entry.as_str()) {
            fail(errors, format!("keyHistory lists {entry} more than once"));
        }
    }
}

fn expected_codec(fragment: &str) -> Option<Codec> {
    match fragment {
        method::FRAGMENT_PQ_ROOT | method::FRAGMENT_PQ_AUTH => Some(Codec::MlDsa65),
        method::FRAGMENT_ES256 => Some(Codec::P256),
        method::FRAGMENT_KEM => Some(Codec::MlKem768),
        method::FRAGMENT_ED25519 => Some(Codec::Ed25519),
        method::FRAGMENT_X25519 => Some(Codec::X25519),
        _ => None,
    }
}

fn check_methods(doc: &IdentityDocument, errors: &mut Vec<DidError>) {
    let mut seen = HashSet::new();
    for vm in &doc.verification_method {
        if !seen.insert(vm.id.as_str()) {
            fail(errors, format!("verification method {} declared twice", vm.id));
        }
        if vm.controller != doc.id {
            fail(
                errors,
                format!("verification method {} has controller {}", vm.id, vm.controller),
            );
        }
        if vm.method_type != method::VERIFICATION_METHOD_TYPE {
            fail(
                errors,
                format!("verification method {} has type {}", vm.id, vm.method_type),
            );
        }
        if multikey::is_placeholder(&vm.public_key_multibase) {
            fail(
                errors,
                format!("verification method {} carries a placeholder key", vm.id),
            );
            continue;
        }
        match multikey::decode_key(&vm.public_key_multibase) {
            Ok((codec, _)) => {
                if codec.algorithm() != vm.algorithm {
                    fail(
                        errors,
                        format!(
                            "verification method {} declares {} but holds a {} key",
                            vm.id,
                            vm.algorithm,
                            codec.algorithm()
                        ),
                    );
                }
                let expected = method::fragment_of(&vm.id).and_then(expected_codec);
                if let Some(expected) = expected.filter(|e| *e != codec) {
                    fail(
                        errors,
                        format!(
                            "verification method {} must hold a {} key",
                            vm.id,
                            expected.algorithm()
                        ),
                    );
                }
            }
            Err(e) => fail(
                errors,
                format!("verification method {} has an undecodable key: {e}", vm.id),
            ),
        }
    }

    for fragment in method::REQUIRED_FRAGMENTS {
        let id = vm_id(&doc.id, fragment);
        if doc.verification_method(&id).is_none() {
            fail(errors, format!("required verification method {id} is missing"));
        }
    }
}

fn check_roles(doc: &IdentityDocument, errors: &mut Vec<DidError>) {
    let id = |fragment: &str| vm_id(&doc.id, fragment);

    let required: [(&str, &[String], &str); 6] = [
        ("authentication", doc.authentication.as_slice(), method::FRAGMENT_PQ_AUTH),
        ("assertionMethod", doc.assertion_method.as_slice(), method::FRAGMENT_PQ_ROOT),
        ("capabilityInvocation", doc.capability_invocation.as_slice(), method::FRAGMENT_PQ_ROOT),
        ("keyAgreement", doc.key_agreement.as_slice(), method::FRAGMENT_KEM),
        ("keyAgreement", doc.key_agreement.as_slice(), method::FRAGMENT_X25519),
        ("updatePolicy.rotationKeys", doc.update_policy.rotation_keys.as_slice(), method::FRAGMENT_PQ_ROOT),
    ];
    for (role, members, fragment) in required {
        let wanted = id(fragment);
        if !members.contains(&wanted) {
            fail(errors, format!("{role} does not include {wanted}"));
        }
    }

    let all: [(&str, &[String]); 5] = [
        ("authentication", doc.authentication.as_slice()),
        ("assertionMethod", doc.assertion_method.as_slice()),
        ("capabilityInvocation", doc.capability_invocation.as_slice()),
        ("keyAgreement", doc.key_agreement.as_slice()),
        ("updatePolicy.rotationKeys", doc.update_policy.rotation_keys.as_slice()),
    ];
    for (role, members) in all {
        for member in members {
            if doc.verification_method(member).is_none() {
                fail(
                    errors,
                    format!("{role} references unknown verification method {member}"),
                );
            }
        }
    }
}

fn check_anchors(doc: &IdentityDocument, errors: &mut Vec<DidError>) {
    let root = vm_id(&doc.id, method::FRAGMENT_PQ_ROOT);
    match doc.attestations.first() {
        None => fail(errors, "attestations is empty"),
        Some(att) if att.vm != root => fail(
            errors,
            format!("attestations[0] references {} instead of {root}", att.vm),
        ),
        Some(_) => {}
    }

    let es256 = vm_id(&doc.id, method::FRAGMENT_ES256);
    if doc.proof.verification_method != es256 {
        fail(
            errors,
            format!(
                "proof references {} instead of {es256}",
                doc.proof.verification_method
            ),
        );
    }
    if doc.proof.proof_type != method::PROOF_TYPE {
        fail(errors, format!("proof type {} is not {}", doc.proof.proof_type, method::PROOF_TYPE));
    }
    if doc.proof.proof_purpose != method::PROOF_PURPOSE {
        fail(
            errors,
            format!(
                "proof purpose {} is not {}",
                doc.proof.proof_purpose,
                method::PROOF_PURPOSE
            ),
        );
    }
}

fn check_core_binding(doc: &IdentityDocument, errors: &mut Vec<DidError>) {
    if doc.core_cbor.is_empty() {
        return;
    }
    let core_bytes = match doc.core_bytes() {
        Ok(bytes) => bytes,
        Err(e) => {
            fail(errors, format!("coreCbor does not decode: {e}"));
            return;
        }
    };
    if !cid::cid_matches(&doc.current_core, &core_bytes) {
        fail(errors, "currentCore is not the CID of coreCbor");
    }
    let core = match CoreObject::decode(&core_bytes) {
        Ok(core) => core,
        Err(e) => {
            fail(errors, format!("coreCbor is not a valid core: {e}"));
            return;
        }
    };

    if core.id != doc.id {
        fail(errors, format!("core id {} differs from document id", core.id));
    }
    if core.controller != doc.controller {
        fail(errors, "core controller differs from document controller");
    }
    if core.sequence != doc.sequence {
        fail(
            errors,
            format!("core sequence {} differs from document sequence {}", core.sequence, doc.sequence),
        );
    }
    if core.prev != doc.prev {
        fail(errors, "core prev differs from document prev");
    }

    for key in &core.keys {
        match doc.verification_method(&key.id) {
            Some(vm) if vm.public_key_multibase == key.pk => {}
            Some(_) => fail(errors, format!("key {} differs between core and document", key.id)),
            None => fail(errors, format!("core key {} is not declared by the document", key.id)),
        }
    }
    for vm in &doc.verification_method {
        if core.key(&vm.id).is_none() {
            fail(errors, format!("verification method {} is not in the core", vm.id));
        }
    }

    let roles: [(&str, &[String], &[String]); 4] = [
        ("authentication", core.authentication.as_slice(), doc.authentication.as_slice()),
        ("assertionMethod", core.assertion.as_slice(), doc.assertion_method.as_slice()),
        ("keyAgreement", core.key_agreement.as_slice(), doc.key_agreement.as_slice()),
        ("updatePolicy.rotationKeys", core.rotation_keys.as_slice(), doc.update_policy.rotation_keys.as_slice()),
    ];
    for (role, in_core, in_doc) in roles {
        if in_core != in_doc {
            fail(errors, format!("{role} differs between core and document"));
        }
    }

    let services_match = core.services.len() == doc.service.len()
        && core.services.iter().zip(&doc.service).all(|(c, d)| {
            c.id == d.id && c.service_type == d.service_type && c.endpoint == d.service_endpoint
        });
    if !services_match {
        fail(errors, "services differ between core and document");
    }
}
