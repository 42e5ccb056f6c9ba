//! Canonical binary encoding (a strict CBOR subset).
//!
//! Header layout: the major type sits in the top three bits and the
//! argument is either inline (0..=23) or follows in 1, 2 or 4 big-endian
//! bytes, always in the shortest form. There is no 8-byte form, so any
//! argument above `u32::MAX` is rejected. Map keys are text and appear in
//! byte-wise lexicographic order.

use std::collections::BTreeMap;

use crate::error::{DidError, Result};

use super::value::CoreValue;

const MAJOR_UNSIGNED: u8 = 0;
const MAJOR_NEGATIVE: u8 = 1;
const MAJOR_BYTES: u8 = 2;
const MAJOR_TEXT: u8 = 3;
const MAJOR_LIST: u8 = 4;
const MAJOR_MAP: u8 = 5;
const MAJOR_SIMPLE: u8 = 7;

const FALSE: u8 = 0xf4;
const TRUE: u8 = 0xf5;

/// Nesting limit applied while decoding untrusted input.
const MAX_DEPTH: usize = 64;

/// Encode a value into canonical bytes.
pub fn encode(value: &CoreValue) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(256);
    encode_into(value, &mut out)?;
    Ok(out)
}

/// Append the canonical encoding of `value` to `out`.
pub fn encode_into(value: &CoreValue, out: &mut Vec<u8>) -> Result<()> {
    match value {
        CoreValue::Integer(n) if *n >= 0 => write_header(MAJOR_UNSIGNED, *n as u64, out),
        CoreValue::Integer(n) => write_header(MAJOR_NEGATIVE, (-1 - *n) as u64, out),
        CoreValue::Bytes(b) => {
            write_header(MAJOR_BYTES, b.len() as u64, out)?;
            out.extend_from_slice(b);
            Ok(())
        }
        CoreValue::Text(s) => write_text(s, out),
        CoreValue::Bool(b) => {
            out.push(if *b { TRUE } else { FALSE });
            Ok(())
        }
        CoreValue::List(items) => {
            write_header(MAJOR_LIST, items.len() as u64, out)?;
            items.iter().try_for_each(|item| encode_into(item, out))
        }
        CoreValue::Map(map) => {
            write_header(MAJOR_MAP, map.len() as u64, out)?;
            // BTreeMap<String, _> iterates in UTF-8 byte order.
            for (key, item) in map {
                write_text(key, out)?;
                encode_into(item, out)?;
            }
            Ok(())
        }
    }
}

fn write_text(s: &str, out: &mut Vec<u8>) -> Result<()> {
    write_header(MAJOR_TEXT, s.len() as u64, out)?;
    out.extend_from_slice(s.as_bytes());
    Ok(())
}

fn write_header(major: u8, arg: u64, out: &mut Vec<u8>) -> Result<()> {
    let m = major << 5;
    if arg < 24 {
        out.push(m | arg as u8);
    } else if arg <= 0xff {
        out.push(m | 24);
        out.push(arg as u8);
    } else if arg <= 0xffff {
        out.push(m | 25);
        out.extend_from_slice(&(arg as u16).to_be_bytes());
    } else if arg <= 0xffff_ffff {
        out.push(m | 26);
        out.extend_from_slice(&(arg as u32).to_be_bytes());
    } else {
        return Err(DidError::UnsupportedValueType(format!(
            "argument {arg} exceeds the 32-bit header range"
        )));
    }
    Ok(())
}

/// Decode canonical bytes back into a value.
///
/// Only the exact output of [`encode`] is accepted: any other encoding of
/// the same logical value is reported as malformed.
pub fn decode(bytes: &[u8]) -> Result<CoreValue> {
    let mut decoder = Decoder { bytes, pos: 0 };
    let value = decoder.value(0)?;
    if decoder.pos != bytes.len() {
        return Err(DidError::malformed(format!(
            "{} trailing bytes after canonical value",
            bytes.len() - decoder.pos
        )));
    }
    Ok(value)
}

struct Decoder<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| DidError::malformed("unexpected end of input"))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn header(&mut self) -> Result<(u8, u64)> {
        let initial = self.take(1)?[0];
        let major = initial >> 5;
        let info = initial & 0x1f;

        if major == MAJOR_SIMPLE {
            return match initial {
                FALSE | TRUE => Ok((major, u64::from(info))),
                other => Err(DidError::malformed(format!(
                    "unsupported simple or float value 0x{other:02x}"
                ))),
            };
        }

        let arg = match info {
            0..=23 => u64::from(info),
            24 => {
                let v = u64::from(self.take(1)?[0]);
                if v < 24 {
                    return Err(DidError::malformed("non-minimal 1-byte header"));
                }
                v
            }
            25 => {
                let b = self.take(2)?;
                let v = u64::from(u16::from_be_bytes([b[0], b[1]]));
                if v <= 0xff {
                    return Err(DidError::malformed("non-minimal 2-byte header"));
                }
                v
            }
            26 => {
                let b = self.take(4)?;
                let v = u64::from(u32::from_be_bytes([b[0], b[1], b[2], b[3]]));
                if v <= 0xffff {
                    return Err(DidError::malformed("non-minimal 4-byte header"));
                }
                v
            }
            27 => return Err(DidError::malformed("8-byte header arguments are not canonical")),
            31 => return Err(DidError::malformed("indefinite lengths are not canonical")),
            _ => return Err(DidError::malformed(format!("reserved header info {info}"))),
        };
        Ok((major, arg))
    }

    fn length(&self, arg: u64) -> Result<usize> {
        let len = usize::try_from(arg).map_err(|_| DidError::malformed("length overflow"))?;
        if len > self.remaining() {
            return Err(DidError::malformed("declared length exceeds input"));
        }
        Ok(len)
    }

    fn text(&mut self, arg: u64) -> Result<String> {
        let len = self.length(arg)?;
        let raw = self.take(len)?;
        std::str::from_utf8(raw)
            .map(str::to_string)
            .map_err(|e| DidError::malformed(format!("invalid UTF-8 in text: {e}")))
    }

    fn value(&mut self, depth: usize) -> Result<CoreValue> {
        if depth > MAX_DEPTH {
            return Err(DidError::malformed("nesting too deep"));
        }
        let (major, arg) = self.header()?;
        match major {
            MAJOR_UNSIGNED => i64::try_from(arg)
                .map(CoreValue::Integer)
                .map_err(|_| DidError::malformed("integer out of range")),
            MAJOR_NEGATIVE => i64::try_from(arg)
                .map(|n| CoreValue::Integer(-1 - n))
                .map_err(|_| DidError::malformed("integer out of range")),
            MAJOR_BYTES => {
                let len = self.length(arg)?;
                Ok(CoreValue::Bytes(self.take(len)?.to_vec()))
            }
            MAJOR_TEXT => self.text(arg).map(CoreValue::Text),
            MAJOR_LIST => {
                // Every item needs at least one byte.
                let count = self.length(arg)?;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(self.value(depth + 1)?);
                }
                Ok(CoreValue::List(items))
            }
            MAJOR_MAP => {
                let count = self.length(arg)?;
                let mut map = BTreeMap::new();
                let mut last_key: Option<String> = None;
                for _ in 0..count {
                    let (key_major, key_arg) = self.header()?;
                    if key_major != MAJOR_TEXT {
                        return Err(DidError::malformed("map keys must be text"));
                    }
                    let key = self.text(key_arg)?;
                    if let Some(prev) = &last_key {
                        if key.as_bytes() <= prev.as_bytes() {
                            return Err(DidError::malformed(format!(
                                "map key \"{key}\" is duplicated or out of order"
                            )));
                        }
                    }
                    let item = self.value(depth + 1)?;
                    last_key = Some(key.clone());
                    map.insert(key, item);
                }
                Ok(CoreValue::Map(map))
            }
            MAJOR_SIMPLE => Ok(CoreValue::Bool(arg == u64::from(TRUE & 0x1f))),
            other => Err(DidError::malformed(format!("unsupported major type {other}"))),
        }
    }
}
