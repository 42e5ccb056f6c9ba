//! The core object: the canonically encoded structure a CID addresses.
//!
//! The core carries every controller key, the role memberships, the update
//! policy, services and the link to the previous core. Its canonical CBOR
//! bytes are what the attestation signs and what `currentCore` hashes.

use std::collections::BTreeMap;

use crate::canonical::{cbor, CoreValue};
use crate::cid;
use crate::error::{DidError, Result};

/// A controller key as recorded in the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreKey {
    /// Verification-method id (`<did>#<fragment>`).
    pub id: String,
    pub key_type: String,
    pub alg: String,
    /// Multikey text.
    pub pk: String,
}

/// A service as recorded in the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreService {
    pub id: String,
    pub service_type: String,
    pub endpoint: String,
}

/// Typed view of the core map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreObject {
    pub id: String,
    pub sequence: u64,
    pub controller: String,
    pub keys: Vec<CoreKey>,
    pub authentication: Vec<String>,
    pub assertion: Vec<String>,
    pub key_agreement: Vec<String>,
    pub rotation_keys: Vec<String>,
    pub services: Vec<CoreService>,
    /// CID of the previous core; present iff `sequence > 1`.
    pub prev: Option<String>,
}

impl CoreObject {
    /// Build the canonical value.
    pub fn to_value(&self) -> Result<CoreValue> {
        let sequence = i64::try_from(self.sequence).map_err(|_| {
            DidError::UnsupportedValueType(format!("sequence {} out of range", self.sequence))
        })?;

        let keys = self
            .keys
            .iter()
            .map(|k| {
                let mut m = BTreeMap::new();
                m.insert("id".to_string(), CoreValue::from(k.id.as_str()));
                m.insert("type".to_string(), CoreValue::from(k.key_type.as_str()));
                m.insert("alg".to_string(), CoreValue::from(k.alg.as_str()));
                m.insert("pk".to_string(), CoreValue::from(k.pk.as_str()));
                CoreValue::Map(m)
            })
            .collect();

        let services = self
            .services
            .iter()
            .map(|s| {
                let mut m = BTreeMap::new();
                m.insert("id".to_string(), CoreValue::from(s.id.as_str()));
                m.insert("type".to_string(), CoreValue::from(s.service_type.as_str()));
                m.insert("endpoint".to_string(), CoreValue::from(s.endpoint.as_str()));
                CoreValue::Map(m)
            })
            .collect();

        let mut update = BTreeMap::new();
        update.insert(
            "rotationKeys".to_string(),
            CoreValue::text_list(&self.rotation_keys),
        );

        let mut map = BTreeMap::new();
        map.insert("id".to_string(), CoreValue::from(self.id.as_str()));
        map.insert("sequence".to_string(), CoreValue::Integer(sequence));
        map.insert("controller".to_string(), CoreValue::from(self.controller.as_str()));
        map.insert("keys".to_string(), CoreValue::List(keys));
        map.insert(
            "authentication".to_string(),
            CoreValue::text_list(&self.authentication),
        );
        map.insert("assertion".to_string(), CoreValue::text_list(&self.assertion));
        map.insert(
            "keyAgreement".to_string(),
            CoreValue::text_list(&self.key_agreement),
        );
        map.insert("update".to_string(), CoreValue::Map(update));
        map.insert("services".to_string(), CoreValue::List(services));
        if let Some(prev) = &self.prev {
            map.insert("prev".to_string(), CoreValue::from(prev.as_str()));
        }
        Ok(CoreValue::Map(map))
    }

    /// Rebuild a core from a decoded value. Unknown keys are rejected.
    pub fn from_value(value: &CoreValue) -> Result<Self> {
        let map = value
            .as_map()
            .ok_or_else(|| DidError::malformed(format!("core is a {}, not a map", value.type_name())))?;
        const KNOWN: [&str; 10] = [
            "id",
            "sequence",
            "controller",
            "keys",
            "authentication",
            "assertion",
            "keyAgreement",
            "update",
            "services",
            "prev",
        ];
        if let Some(unknown) = map.keys().find(|k| !KNOWN.contains(&k.as_str())) {
            return Err(DidError::malformed(format!("unknown core field {unknown:?}")));
        }

        let sequence = field(map, "sequence")?
            .as_integer()
            .and_then(|n| u64::try_from(n).ok())
            .ok_or_else(|| DidError::malformed("core sequence is not a non-negative integer"))?;

        let keys = list_field(map, "keys")?
            .iter()
            .map(|item| {
                let m = as_map(item, "keys[]")?;
                Ok(CoreKey {
                    id: text_field(m, "id")?,
                    key_type: text_field(m, "type")?,
                    alg: text_field(m, "alg")?,
                    pk: text_field(m, "pk")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let services = list_field(map, "services")?
            .iter()
            .map(|item| {
                let m = as_map(item, "services[]")?;
                Ok(CoreService {
                    id: text_field(m, "id")?,
                    service_type: text_field(m, "type")?,
                    endpoint: text_field(m, "endpoint")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let update = as_map(field(map, "update")?, "update")?;

        Ok(Self {
            id: text_field(map, "id")?,
            sequence,
            controller: text_field(map, "controller")?,
            keys,
            authentication: text_list_field(map, "authentication")?,
            assertion: text_list_field(map, "assertion")?,
            key_agreement: text_list_field(map, "keyAgreement")?,
            rotation_keys: text_list_field(update, "rotationKeys")?,
            services,
            prev: map
                .get("prev")
                .map(|v| {
                    v.as_text()
                        .map(str::to_string)
                        .ok_or_else(|| DidError::malformed("core prev is not text"))
                })
                .transpose()?,
        })
    }

    /// Canonical bytes and CID.
    pub fn encode(&self) -> Result<(Vec<u8>, String)> {
        cid::encode_core(&self.to_value()?)
    }

    /// Parse canonical core bytes.
    pub fn decode(core_bytes: &[u8]) -> Result<Self> {
        Self::from_value(&cbor::decode(core_bytes)?)
    }

    /// Multikey text of a key by id.
    pub fn key(&self, id: &str) -> Option<&CoreKey> {
        self.keys.iter().find(|k| k.id == id)
    }
}

fn field<'a>(map: &'a BTreeMap<String, CoreValue>, name: &str) -> Result<&'a CoreValue> {
    map.get(name)
        .ok_or_else(|| DidError::malformed(format!("core field {name:?} missing")))
}

fn as_map<'a>(value: &'a CoreValue, what: &str) -> Result<&'a BTreeMap<String, CoreValue>> {
    value
        .as_map()
        .ok_or_else(|| DidError::malformed(format!("core {what} is a {}, not a map", value.type_name())))
}

fn text_field(map: &BTreeMap<String, CoreValue>, name: &str) -> Result<String> {
    field(map, name)?
        .as_text()
        .map(str::to_string)
        .ok_or_else(|| DidError::malformed(format!("core field {name:?} is not text")))
}

fn list_field<'a>(map: &'a BTreeMap<String, CoreValue>, name: &str) -> Result<&'a [CoreValue]> {
    field(map, name)?
        .as_list()
        .ok_or_else(|| DidError::malformed(format!("core field {name:?} is not a list")))
}

fn text_list_field(map: &BTreeMap<String, CoreValue>, name: &str) -> Result<Vec<String>> {
    list_field(map, name)?
        .iter()
        .map(|v| {
            v.as_text()
                .map(str::to_string)
                .ok_or_else(|| DidError::malformed(format!("core field {name:?} holds non-text")))
        })
        .collect()
}
