//! Canonical JSON form.
//!
//! Object members are emitted in UTF-8 byte order of their keys, arrays
//! keep their order, and no whitespace separates tokens. Strings go through
//! serde_json's escaper so any conforming JSON-text escaper reproduces them:
//! `\"`, `\\`, the short escapes `\b \f \n \r \t`, other control characters
//! as lowercase `\u00xx`, everything else (including non-ASCII) verbatim.

use serde::Serialize;
use serde_json::{Number, Value};

use crate::error::{DidError, Result};

/// Canonical JSON bytes of a JSON value.
pub fn canonicalize(value: &Value) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(1024);
    write_value(value, &mut out)?;
    Ok(out)
}

/// Canonical JSON bytes of any serializable record.
///
/// The record is first round-tripped through `serde_json::Value`, so
/// `#[serde(rename)]`, `skip_serializing_if` and friends decide the shape.
pub fn canonicalize_serializable<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let value = serde_json::to_value(value)?;
    canonicalize(&value)
}

/// Canonical JSON as a `String`.
pub fn canonical_string(value: &Value) -> Result<String> {
    let bytes = canonicalize(value)?;
    String::from_utf8(bytes).map_err(|e| DidError::Serialization(e.to_string()))
}

fn write_value(value: &Value, out: &mut Vec<u8>) -> Result<()> {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(true) => out.extend_from_slice(b"true"),
        Value::Bool(false) => out.extend_from_slice(b"false"),
        Value::Number(n) => write_number(n, out)?,
        Value::String(s) => write_string(s, out)?,
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_value(item, out)?;
            }
            out.push(b']');
        }
        Value::Object(obj) => {
            let mut members: Vec<(&String, &Value)> = obj.iter().collect();
            members.sort_unstable_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
            out.push(b'{');
            for (i, (key, item)) in members.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_string(key, out)?;
                out.push(b':');
                write_value(item, out)?;
            }
            out.push(b'}');
        }
    }
    Ok(())
}

fn write_string(s: &str, out: &mut Vec<u8>) -> Result<()> {
    serde_json::to_writer(&mut *out, s)?;
    Ok(())
}

fn write_number(n: &Number, out: &mut Vec<u8>) -> Result<()> {
    if let Some(i) = n.as_i64() {
        out.extend_from_slice(i.to_string().as_bytes());
    } else if let Some(u) = n.as_u64() {
        out.extend_from_slice(u.to_string().as_bytes());
    } else {
        let f = n
            .as_f64()
            .filter(|f| f.is_finite())
            .ok_or_else(|| DidError::UnsupportedValueType(format!("number {n}")))?;
        // Shortest round-trip digits, never an exponent; -0 prints as 0.
        let text = if f == 0.0 { "0".to_string() } else { format!("{f}") };
        out.extend_from_slice(text.as_bytes());
    }
    Ok(())
}
