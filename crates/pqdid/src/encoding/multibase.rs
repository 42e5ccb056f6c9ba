//! Multibase text encodings.
//!
//! Only the three bases this method uses are supported:
//! base58btc (`z`), base64url without padding (`u`) and
//! lowercase base32 without padding (`b`).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use data_encoding::BASE32_NOPAD;

use crate::error::{DidError, Result};

/// A supported multibase alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Base {
    Base58Btc,
    Base64Url,
    Base32Lower,
}

impl Base {
    /// The single-character multibase prefix.
    pub fn prefix(self) -> char {
        match self {
            Self::Base58Btc => 'z',
            Self::Base64Url => 'u',
            Self::Base32Lower => 'b',
        }
    }

    /// Look up a base by its prefix character.
    pub fn from_prefix(c: char) -> Result<Self> {
        match c {
            'z' => Ok(Self::Base58Btc),
            'u' => Ok(Self::Base64Url),
            'b' => Ok(Self::Base32Lower),
            other => Err(DidError::malformed(format!(
                "unsupported multibase prefix '{other}'"
            ))),
        }
    }
}

/// Encode bytes with the given base, prefix included.
pub fn encode(base: Base, bytes: &[u8]) -> String {
    let body = match base {
        Base::Base58Btc => bs58::encode(bytes).into_string(),
        Base::Base64Url => URL_SAFE_NO_PAD.encode(bytes),
        Base::Base32Lower => BASE32_NOPAD.encode(bytes).to_ascii_lowercase(),
    };
    let mut out = String::with_capacity(body.len() + 1);
    out.push(base.prefix());
    out.push_str(&body);
    out
}

/// Decode a multibase string, returning the base it used.
pub fn decode(text: &str) -> Result<(Base, Vec<u8>)> {
    let mut chars = text.chars();
    let prefix = chars
        .next()
        .ok_or_else(|| DidError::malformed("empty multibase string"))?;
    let base = Base::from_prefix(prefix)?;
    let body = chars.as_str();
    let bytes = match base {
        Base::Base58Btc => bs58::decode(body)
            .into_vec()
            .map_err(|e| DidError::malformed(format!("invalid base58btc: {e}")))?,
        Base::Base64Url => base64url_decode(body)?,
        Base::Base32Lower => {
            if body.bytes().any(|b| b.is_ascii_uppercase()) {
                return Err(DidError::malformed("base32 text must be lowercase"));
            }
            BASE32_NOPAD
                .decode(body.to_ascii_uppercase().as_bytes())
                .map_err(|e| DidError::malformed(format!("invalid base32: {e}")))?
        }
    };
    Ok((base, bytes))
}

/// Decode a multibase string that must use `expected`.
pub fn decode_expecting(expected: Base, text: &str) -> Result<Vec<u8>> {
    let (base, bytes) = decode(text)?;
    if base != expected {
        return Err(DidError::malformed(format!(
            "expected multibase '{}', found '{}'",
            expected.prefix(),
            base.prefix()
        )));
    }
    Ok(bytes)
}

/// Plain base64url without padding (no multibase prefix).
pub fn base64url_encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Inverse of [`base64url_encode`].
pub fn base64url_decode(text: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(text)
        .map_err(|e| DidError::malformed(format!("invalid base64url: {e}")))
}
