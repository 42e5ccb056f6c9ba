//! Classical rail: a compact JWS over the core's CID.
//!
//! `jws = b64url(header) "." b64url(cid) "." b64url(r || s)` where the
//! header is fixed to `{"alg":"ES256"}` and the signature covers the first
//! two segments joined by `.`.

use serde::{Deserialize, Serialize};

use crate::crypto::es256::{self, ClassicalSigner};
use crate::encoding::multibase::{base64url_decode, base64url_encode};
use crate::error::{DidError, Result};
use crate::method;

/// Protected header of every proof JWS.
pub const JWS_HEADER: &str = r#"{"alg":"ES256"}"#;

/// A classical ES256 proof over a core CID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Proof {
    #[serde(rename = "type")]
    pub proof_type: String,
    /// RFC 3339, seconds precision.
    pub created: String,
    pub verification_method: String,
    pub proof_purpose: String,
    pub jws: String,
}

/// The three segments of a compact JWS, decoded.
#[derive(Debug, Clone)]
pub struct CompactJws {
    pub header: serde_json::Value,
    pub payload: Vec<u8>,
    pub signature: Vec<u8>,
    signing_input: String,
}

impl CompactJws {
    /// `header_b64 "." payload_b64`, exactly as received.
    pub fn signing_input(&self) -> &str {
        &self.signing_input
    }

    pub fn alg(&self) -> Option<&str> {
        self.header.get("alg").and_then(|v| v.as_str())
    }
}

/// The bytes an ES256 signer sees for a payload.
pub fn signing_input(payload: &[u8]) -> String {
    format!(
        "{}.{}",
        base64url_encode(JWS_HEADER.as_bytes()),
        base64url_encode(payload)
    )
}

/// Split and decode a compact JWS.
pub fn parse_jws(jws: &str) -> Result<CompactJws> {
    let mut parts = jws.split('.');
    let (Some(h), Some(p), Some(s), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(DidError::malformed("JWS must have exactly three segments"));
    };

    let header_bytes = base64url_decode(h)?;
    let header: serde_json::Value = serde_json::from_slice(&header_bytes)
        .map_err(|e| DidError::malformed(format!("JWS header is not JSON: {e}")))?;
    if !header.is_object() {
        return Err(DidError::malformed("JWS header is not a JSON object"));
    }

    Ok(CompactJws {
        header,
        payload: base64url_decode(p)?,
        signature: base64url_decode(s)?,
        signing_input: format!("{h}.{p}"),
    })
}

/// Sign a CID with the classical signer.
pub fn sign(cid: &str, signer: &ClassicalSigner, vm: &str) -> Result<Proof> {
    if cid.is_empty() {
        return Err(DidError::EmptyInput("proof payload CID".into()));
    }
    let input = signing_input(cid.as_bytes());
    let signature = signer.sign(input.as_bytes())?;
    let jws = format!("{input}.{}", base64url_encode(&signature.to_bytes()));
    log::debug!("proof over {cid} signed by {vm}");

    Ok(Proof {
        proof_type: method::PROOF_TYPE.to_string(),
        created: crate::time::now_rfc3339(),
        verification_method: vm.to_string(),
        proof_purpose: method::PROOF_PURPOSE.to_string(),
        jws,
    })
}

impl Proof {
    /// Verify the JWS against the expected CID and a SEC1 P-256 key.
    pub fn verify(&self, cid: &str, public_key: &[u8]) -> Result<()> {
        let jws = parse_jws(&self.jws)?;
        match jws.alg() {
            Some(es256::ALGORITHM) => {}
            other => {
                return Err(DidError::CryptoVerificationFailure(format!(
                    "JWS alg {other:?} is not {}",
                    es256::ALGORITHM
                )))
            }
        }
        if jws.payload != cid.as_bytes() {
            return Err(DidError::CryptoVerificationFailure(
                "JWS payload does not match currentCore".into(),
            ));
        }
        es256::verify(public_key, jws.signing_input().as_bytes(), &jws.signature)
    }
}
