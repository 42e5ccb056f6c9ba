//! Unsigned LEB128 varints as used by multiformats.
//!
//! Values are limited to 63 bits (at most nine bytes) and decoding
//! rejects non-minimal encodings, so every value has exactly one form.

use crate::error::{DidError, Result};

/// Longest accepted encoding in bytes.
pub const MAX_LEN: usize = 9;

/// Append the varint encoding of `value` to `out`.
pub fn encode_into(mut value: u64, out: &mut Vec<u8>) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Encode `value` into a fresh buffer.
pub fn encode(value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(4);
    encode_into(value, &mut out);
    out
}

/// Decode a varint from the front of `bytes`.
///
/// Returns the value and the number of bytes consumed.
pub fn decode(bytes: &[u8]) -> Result<(u64, usize)> {
    let mut value: u64 = 0;
    for (i, &byte) in bytes.iter().enumerate() {
        if i >= MAX_LEN {
            return Err(DidError::malformed("varint longer than 9 bytes"));
        }
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            if i > 0 && byte == 0 {
                return Err(DidError::malformed("non-minimal varint encoding"));
            }
            return Ok((value, i + 1));
        }
    }
    Err(DidError::malformed("truncated varint"))
}
