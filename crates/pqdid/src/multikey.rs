//! Multikey public key encoding.
//!
//! A Multikey is `multibase(varint(codec) ++ raw_key)`. Classical and
//! curve keys use base58btc (`z...`); post-quantum keys are large and
//! base58 cost grows superlinearly, so they use base64url (`u...`).
//!
//! SEC1 keys (P-256, secp256k1) are always stored compressed.

use crate::encoding::multibase::{self, Base};
use crate::encoding::varint;
use crate::error::{DidError, Result};

/// Prefix of the legacy placeholder emitted when encoding fails.
///
/// `I` is outside the base58btc alphabet, so no real Multikey can carry it.
pub const PLACEHOLDER_PREFIX: &str = "zINVALID-";

/// Key algorithms with a registered multicodec id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codec {
    Ed25519,
    X25519,
    Secp256k1,
    P256,
    MlKem512,
    MlKem768,
    MlKem1024,
    MlDsa44,
    MlDsa65,
    MlDsa87,
}

impl Codec {
    pub const ALL: [Codec; 10] = [
        Codec::Ed25519,
        Codec::X25519,
        Codec::Secp256k1,
        Codec::P256,
        Codec::MlKem512,
        Codec::MlKem768,
        Codec::MlKem1024,
        Codec::MlDsa44,
        Codec::MlDsa65,
        Codec::MlDsa87,
    ];

    /// Multicodec table id.
    pub fn code(self) -> u64 {
        match self {
            Self::Ed25519 => 0xed,
            Self::X25519 => 0xec,
            Self::Secp256k1 => 0xe7,
            Self::P256 => 0x1200,
            Self::MlKem512 => 0x120b,
            Self::MlKem768 => 0x120c,
            Self::MlKem1024 => 0x120d,
            Self::MlDsa44 => 0x1210,
            Self::MlDsa65 => 0x1211,
            Self::MlDsa87 => 0x1212,
        }
    }

    pub fn from_code(code: u64) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.code() == code)
            .ok_or_else(|| DidError::malformed(format!("unknown multicodec 0x{code:x}")))
    }

    /// Algorithm name as written in verification methods.
    pub fn algorithm(self) -> &'static str {
        match self {
            Self::Ed25519 => "Ed25519",
            Self::X25519 => "X25519",
            Self::Secp256k1 => "secp256k1",
            Self::P256 => "P-256",
            Self::MlKem512 => "ML-KEM-512",
            Self::MlKem768 => "ML-KEM-768",
            Self::MlKem1024 => "ML-KEM-1024",
            Self::MlDsa44 => "ML-DSA-44",
            Self::MlDsa65 => "ML-DSA-65",
            Self::MlDsa87 => "ML-DSA-87",
        }
    }

    /// Expected length of the raw (normalized) public key.
    pub fn key_len(self) -> usize {
        match self {
            Self::Ed25519 | Self::X25519 => 32,
            Self::Secp256k1 | Self::P256 => 33,
            Self::MlKem512 => 800,
            Self::MlKem768 => 1184,
            Self::MlKem1024 => 1568,
            Self::MlDsa44 => 1312,
            Self::MlDsa65 => 1952,
            Self::MlDsa87 => 2592,
        }
    }

    pub fn is_post_quantum(self) -> bool {
        matches!(
            self,
            Self::MlKem512
                | Self::MlKem768
                | Self::MlKem1024
                | Self::MlDsa44
                | Self::MlDsa65
                | Self::MlDsa87
        )
    }

    pub fn is_sec1(self) -> bool {
        matches!(self, Self::P256 | Self::Secp256k1)
    }

    /// Text encoding used for this family.
    pub fn base(self) -> Base {
        if self.is_post_quantum() {
            Base::Base64Url
        } else {
            Base::Base58Btc
        }
    }
}

/// Normalize a SEC1 point to its 33-byte compressed form.
///
/// Compressed input is passed through; uncompressed (`0x04 || x || y`)
/// input is compressed by taking the parity of `y`.
pub fn compress_sec1(raw: &[u8]) -> Result<Vec<u8>> {
    match (raw.len(), raw.first()) {
        (33, Some(0x02 | 0x03)) => Ok(raw.to_vec()),
        (65, Some(0x04)) => {
            let parity = raw[64] & 1;
            let mut out = Vec::with_capacity(33);
            out.push(0x02 | parity);
            out.extend_from_slice(&raw[1..33]);
            Ok(out)
        }
        (len, first) => Err(DidError::malformed(format!(
            "SEC1 key must be 33 bytes (0x02/0x03) or 65 bytes (0x04), got {len} bytes starting {}",
            first.map(|b| format!("0x{b:02x}")).unwrap_or_else(|| "<empty>".into())
        ))),
    }
}

/// Encode a raw public key as a Multikey string.
pub fn encode_key(codec: Codec, raw: &[u8]) -> Result<String> {
    let key = if codec.is_sec1() {
        compress_sec1(raw)?
    } else {
        raw.to_vec()
    };
    if key.len() != codec.key_len() {
        return Err(DidError::malformed(format!(
            "{} key must be {} bytes, got {}",
            codec.algorithm(),
            codec.key_len(),
            key.len()
        )));
    }

    let mut payload = varint::encode(codec.code());
    payload.extend_from_slice(&key);
    let text = multibase::encode(codec.base(), &payload);
    log::trace!(
        "multikey {}: {} raw bytes -> {} chars",
        codec.algorithm(),
        raw.len(),
        text.len()
    );
    Ok(text)
}

/// Legacy encoder that never fails.
///
/// On error it returns `zINVALID-<algorithm>`; callers must test the result
/// with [`is_placeholder`]. Prefer [`encode_key`].
pub fn encode_key_or_placeholder(codec: Codec, raw: &[u8]) -> String {
    match encode_key(codec, raw) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("multikey fallback for {}: {e}", codec.algorithm());
            format!("{PLACEHOLDER_PREFIX}{}", codec.algorithm())
        }
    }
}

/// Whether a string is the legacy encoding-failure placeholder.
pub fn is_placeholder(text: &str) -> bool {
    text.starts_with(PLACEHOLDER_PREFIX)
}

/// Decode a Multikey string into its codec and raw key bytes.
pub fn decode_key(text: &str) -> Result<(Codec, Vec<u8>)> {
    if is_placeholder(text) {
        return Err(DidError::malformed(format!("placeholder key {text}")));
    }
    let (base, payload) = multibase::decode(text)?;
    let (code, n) = varint::decode(&payload)?;
    let codec = Codec::from_code(code)?;
    if base != codec.base() {
        return Err(DidError::malformed(format!(
            "{} keys must use multibase '{}', found '{}'",
            codec.algorithm(),
            codec.base().prefix(),
            base.prefix()
        )));
    }
    let key = payload[n..].to_vec();
    if key.len() != codec.key_len() {
        return Err(DidError::malformed(format!(
            "{} key must be {} bytes, got {}",
            codec.algorithm(),
            codec.key_len(),
            key.len()
        )));
    }
    Ok((codec, key))
}

/// Decode a Multikey and require a specific codec.
pub fn decode_key_expecting(expected: Codec, text: &str) -> Result<Vec<u8>> {
    let (codec, key) = decode_key(text)?;
    if codec != expected {
        return Err(DidError::InvalidKey(format!(
            "expected {} key, found {}",
            expected.algorithm(),
            codec.algorithm()
        )));
    }
    Ok(key)
}
