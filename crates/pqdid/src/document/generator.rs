//! Document assembly.
//!
//! Builds the core from the key material, encodes it, signs both rails and
//! assembles the document. Nothing is stored; the only side effects are the
//! two signing calls.

use std::collections::HashSet;

use crate::anchor::{attestation, proof};
use crate::cid;
use crate::crypto::es256::ClassicalSigner;
use crate::encoding::multibase::{self, Base};
use crate::error::{DidError, Result};
use crate::keys::KeyMaterial;
use crate::method::{self, vm_id};
use crate::multikey::{self, Codec};

use super::core::{CoreKey, CoreObject, CoreService};
use super::model::{IdentityDocument, Service, UpdatePolicy, VerificationMethod};

/// Builder for one document version.
pub struct DocumentBuilder {
    identifier: String,
    prior_history: Vec<String>,
    services: Vec<Service>,
    aliases: Vec<String>,
}

impl DocumentBuilder {
    /// Start building a document for `identifier`.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            prior_history: Vec::new(),
            services: Vec::new(),
            aliases: Vec::new(),
        }
    }

    /// CIDs of every earlier core, oldest first.
    pub fn prior_history(mut self, history: Vec<String>) -> Self {
        self.prior_history = history;
        self
    }

    /// Chain to an existing document: history becomes its
    /// `keyHistory` plus its `currentCore`.
    pub fn succeeding(self, previous: &IdentityDocument) -> Self {
        self.prior_history(previous.successor_history())
    }

    pub fn service(mut self, service: Service) -> Self {
        self.services.push(service);
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Encode, sign and assemble.
    pub fn sign(self, keys: &KeyMaterial) -> Result<IdentityDocument> {
        create(
            &self.identifier,
            keys,
            &self.prior_history,
            &self.services,
            &self.aliases,
        )
    }
}

/// Create a document version.
///
/// `sequence` is `prior_key_history.len() + 1` and `prev` is the last prior
/// CID. The new CID is never appended to `keyHistory`.
pub fn create(
    identifier: &str,
    keys: &KeyMaterial,
    prior_key_history: &[String],
    services: &[Service],
    aliases: &[String],
) -> Result<IdentityDocument> {
    method::validate_did(identifier)?;
    check_history(prior_key_history)?;
    check_services(services)?;
    let signer = keys.signer()?;
    check_signer_matches(signer, &keys.classical_public)?;

    let did = identifier.to_string();
    let sequence = prior_key_history.len() as u64 + 1;
    let prev = prior_key_history.last().cloned();

    let verification_method = verification_methods(&did, keys)?;
    let id = |fragment: &str| vm_id(&did, fragment);

    let authentication = vec![
        id(method::FRAGMENT_PQ_AUTH),
        id(method::FRAGMENT_ES256),
        id(method::FRAGMENT_ED25519),
    ];
    let assertion_method = vec![
        id(method::FRAGMENT_PQ_ROOT),
        id(method::FRAGMENT_ES256),
        id(method::FRAGMENT_ED25519),
    ];
    let capability_invocation = vec![id(method::FRAGMENT_PQ_ROOT), id(method::FRAGMENT_ES256)];
    let key_agreement = vec![id(method::FRAGMENT_KEM), id(method::FRAGMENT_X25519)];
    let rotation_keys = vec![id(method::FRAGMENT_PQ_ROOT), id(method::FRAGMENT_ES256)];

    let core = CoreObject {
        id: did.clone(),
        sequence,
        controller: did.clone(),
        keys: verification_method
            .iter()
            .map(|vm| CoreKey {
                id: vm.id.clone(),
                key_type: vm.method_type.clone(),
                alg: vm.algorithm.clone(),
                pk: vm.public_key_multibase.clone(),
            })
            .collect(),
        authentication: authentication.clone(),
        assertion: assertion_method.clone(),
        key_agreement: key_agreement.clone(),
        rotation_keys: rotation_keys.clone(),
        services: services
            .iter()
            .map(|s| CoreService {
                id: s.id.clone(),
                service_type: s.service_type.clone(),
                endpoint: s.service_endpoint.clone(),
            })
            .collect(),
        prev: prev.clone(),
    };
    let (core_bytes, current_core) = core.encode()?;

    let attestation = attestation::sign(
        &core_bytes,
        &keys.pq_root_secret,
        &id(method::FRAGMENT_PQ_ROOT),
    )?;
    attestation
        .verify(&core_bytes, &keys.pq_root_public)
        .map_err(|_| DidError::InvalidKey("root secret key does not match #pq-root".into()))?;

    let proof = proof::sign(&current_core, signer, &id(method::FRAGMENT_ES256))?;

    log::debug!("created {did} sequence {sequence} core {current_core}");
    Ok(IdentityDocument {
        context: method::REQUIRED_CONTEXTS.iter().map(|c| c.to_string()).collect(),
        id: did.clone(),
        controller: did,
        also_known_as: aliases.to_vec(),
        sequence,
        prev,
        current_core,
        core_cbor: multibase::encode(Base::Base64Url, &core_bytes),
        key_history: prior_key_history.to_vec(),
        verification_method,
        authentication,
        assertion_method,
        capability_invocation,
        key_agreement,
        update_policy: UpdatePolicy { rotation_keys },
        service: services.to_vec(),
        attestations: vec![attestation],
        proof,
    })
}

fn verification_methods(did: &str, keys: &KeyMaterial) -> Result<Vec<VerificationMethod>> {
    let mut entries: Vec<(&str, Codec, &[u8])> = vec![
        (method::FRAGMENT_PQ_ROOT, Codec::MlDsa65, keys.pq_root_public.as_slice()),
        (method::FRAGMENT_PQ_AUTH, Codec::MlDsa65, keys.pq_auth_public.as_slice()),
        (method::FRAGMENT_ES256, Codec::P256, keys.classical_public.as_slice()),
        (method::FRAGMENT_KEM, Codec::MlKem768, keys.kem_public.as_slice()),
        (method::FRAGMENT_ED25519, Codec::Ed25519, keys.ed25519_public.as_slice()),
        (method::FRAGMENT_X25519, Codec::X25519, keys.x25519_public.as_slice()),
    ];

    let mut seen: HashSet<&str> = method::REQUIRED_FRAGMENTS.into_iter().collect();
    for chain_key in &keys.blockchain_keys {
        if !matches!(chain_key.codec, Codec::Secp256k1 | Codec::Ed25519) {
            return Err(DidError::InvalidKey(format!(
                "{} is not a supported blockchain key type",
                chain_key.codec.algorithm()
            )));
        }
        if chain_key.chain.is_empty() || !seen.insert(chain_key.chain.as_str()) {
            return Err(DidError::structural(format!(
                "blockchain key fragment {:?} is empty or already used",
                chain_key.chain
            )));
        }
        entries.push((
            chain_key.chain.as_str(),
            chain_key.codec,
            chain_key.public_key.as_slice(),
        ));
    }

    entries
        .into_iter()
        .map(|(fragment, codec, raw)| {
            let public_key_multibase = multikey::encode_key(codec, raw).map_err(|e| {
                DidError::InvalidKey(format!("#{fragment}: {e}"))
            })?;
            Ok(VerificationMethod {
                id: vm_id(did, fragment),
                controller: did.to_string(),
                method_type: method::VERIFICATION_METHOD_TYPE.to_string(),
                algorithm: codec.algorithm().to_string(),
                public_key_multibase,
            })
        })
        .collect()
}

fn check_history(history: &[String]) -> Result<()> {
    let mut seen = HashSet::with_capacity(history.len());
    for entry in history {
        cid::parse_cid(entry)?;
        if !seen.insert(entry.as_str()) {
            return Err(DidError::structural(format!(
                "prior history lists {entry} more than once"
            )));
        }
    }
    Ok(())
}

fn check_services(services: &[Service]) -> Result<()> {
    let mut seen = HashSet::with_capacity(services.len());
    for service in services {
        if service.id.is_empty() {
            return Err(DidError::structural("service id is empty"));
        }
        if !seen.insert(service.id.as_str()) {
            return Err(DidError::structural(format!(
                "service id {} appears more than once",
                service.id
            )));
        }
    }
    Ok(())
}

fn check_signer_matches(signer: &ClassicalSigner, classical_public: &[u8]) -> Result<()> {
    let Some(signer_public) = signer.software_public_key() else {
        return Ok(());
    };
    let declared = multikey::compress_sec1(classical_public)
        .map_err(|e| DidError::InvalidKey(format!("#es256: {e}")))?;
    if signer_public != declared {
        return Err(DidError::InvalidKey(
            "classical signer does not match #es256".into(),
        ));
    }
    Ok(())
}
