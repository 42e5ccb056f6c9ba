//! Content addressing.
//!
//! A core's CID is
//! `"b" + base32lower(0x01 ++ varint(0x71) ++ varint(0x12) ++ varint(32) ++ sha256(core_bytes))`:
//! version 1, canonical-CBOR content type, SHA-256 multihash. Every CID this
//! crate produces therefore begins with `bafyrei`.

use sha2::{Digest, Sha256};

use crate::canonical::{cbor, CoreValue};
use crate::encoding::multibase::{self, Base};
use crate::encoding::varint;
use crate::error::{DidError, Result};

/// CID version byte.
pub const CID_VERSION: u8 = 0x01;
/// Multicodec content type for canonical CBOR with sorted-map semantics.
pub const CODEC_DAG_CBOR: u64 = 0x71;
/// Multihash code for SHA-256.
pub const HASH_SHA2_256: u64 = 0x12;
/// SHA-256 digest length in bytes.
pub const DIGEST_LEN: usize = 32;

/// The decoded fields of a CID string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCid {
    pub version: u8,
    pub codec: u64,
    pub hash_code: u64,
    pub digest: [u8; DIGEST_LEN],
}

/// Derive the CID of canonical core bytes.
pub fn compute_cid(core_bytes: &[u8]) -> String {
    let digest = Sha256::digest(core_bytes);
    let mut raw = Vec::with_capacity(4 + DIGEST_LEN);
    raw.push(CID_VERSION);
    varint::encode_into(CODEC_DAG_CBOR, &mut raw);
    varint::encode_into(HASH_SHA2_256, &mut raw);
    varint::encode_into(DIGEST_LEN as u64, &mut raw);
    raw.extend_from_slice(&digest);
    multibase::encode(Base::Base32Lower, &raw)
}

/// Encode a core value canonically and derive its CID.
pub fn encode_core(value: &CoreValue) -> Result<(Vec<u8>, String)> {
    let core_bytes = cbor::encode(value)?;
    let cid = compute_cid(&core_bytes);
    log::trace!("encoded core: {} bytes -> {cid}", core_bytes.len());
    Ok((core_bytes, cid))
}

/// Parse and validate a CID string produced by this method.
pub fn parse_cid(text: &str) -> Result<ParsedCid> {
    let raw = multibase::decode_expecting(Base::Base32Lower, text)?;
    let (&version, rest) = raw
        .split_first()
        .ok_or_else(|| DidError::malformed("empty CID"))?;
    if version != CID_VERSION {
        return Err(DidError::malformed(format!("unsupported CID version {version}")));
    }

    let (codec, n) = varint::decode(rest)?;
    let rest = &rest[n..];
    if codec != CODEC_DAG_CBOR {
        return Err(DidError::malformed(format!("unexpected CID content type 0x{codec:x}")));
    }

    let (hash_code, n) = varint::decode(rest)?;
    let rest = &rest[n..];
    if hash_code != HASH_SHA2_256 {
        return Err(DidError::malformed(format!("unexpected hash algorithm 0x{hash_code:x}")));
    }

    let (len, n) = varint::decode(rest)?;
    let rest = &rest[n..];
    if len != DIGEST_LEN as u64 || rest.len() != DIGEST_LEN {
        return Err(DidError::malformed(format!(
            "digest length {len} does not match {} bytes present",
            rest.len()
        )));
    }

    let mut digest = [0u8; DIGEST_LEN];
    digest.copy_from_slice(rest);
    Ok(ParsedCid {
        version,
        codec,
        hash_code,
        digest,
    })
}

/// Does `cid` address exactly these bytes?
pub fn cid_matches(cid: &str, core_bytes: &[u8]) -> bool {
    compute_cid(core_bytes) == cid
}
