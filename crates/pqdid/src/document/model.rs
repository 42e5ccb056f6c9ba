//! The identity document and its parts, in their JSON shape.

use serde::{Deserialize, Serialize};

use crate::anchor::{Attestation, Proof};
use crate::canonical::canonicalize_serializable;
use crate::encoding::multibase::{self, Base};
use crate::error::Result;

/// A public key declared by the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VerificationMethod {
    pub id: String,
    pub controller: String,
    #[serde(rename = "type")]
    pub method_type: String,
    pub algorithm: String,
    pub public_key_multibase: String,
}

/// Keys allowed to authorize the next rotation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdatePolicy {
    pub rotation_keys: Vec<String>,
}

/// A service endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Service {
    pub id: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub service_endpoint: String,
}

impl Service {
    pub fn new(
        id: impl Into<String>,
        service_type: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            service_type: service_type.into(),
            service_endpoint: endpoint.into(),
        }
    }
}

/// One immutable version of an identity document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IdentityDocument {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    pub id: String,
    pub controller: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub also_known_as: Vec<String>,
    pub sequence: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
    /// CID of `coreCbor`.
    pub current_core: String,
    /// Canonical core bytes, multibase base64url.
    pub core_cbor: String,
    /// Prior core CIDs, oldest first.
    #[serde(default)]
    pub key_history: Vec<String>,
    pub verification_method: Vec<VerificationMethod>,
    pub authentication: Vec<String>,
    pub assertion_method: Vec<String>,
    pub capability_invocation: Vec<String>,
    pub key_agreement: Vec<String>,
    pub update_policy: UpdatePolicy,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<Service>,
    pub attestations: Vec<Attestation>,
    pub proof: Proof,
}

impl IdentityDocument {
    /// Pretty-printed JSON, for display and files.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a document. Members outside the document shape are an error.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Canonical JSON bytes; what callers store next to the document.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>> {
        canonicalize_serializable(self)
    }

    /// Decode `coreCbor`.
    pub fn core_bytes(&self) -> Result<Vec<u8>> {
        multibase::decode_expecting(Base::Base64Url, &self.core_cbor)
    }

    pub fn verification_method(&self, id: &str) -> Option<&VerificationMethod> {
        self.verification_method.iter().find(|vm| vm.id == id)
    }

    /// The history a successor of this document must carry:
    /// `keyHistory` followed by `currentCore`.
    pub fn successor_history(&self) -> Vec<String> {
        let mut history = self.key_history.clone();
        history.push(self.current_core.clone());
        history
    }
}
