//! The closed value universe accepted by the canonical binary encoder.

use std::collections::BTreeMap;

use crate::error::{DidError, Result};

/// A value that can be canonically encoded.
///
/// Map keys are held in a `BTreeMap<String, _>`, whose iteration order is
/// byte-wise lexicographic over the UTF-8 key bytes. That order is the
/// canonical one, so insertion order never reaches the encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreValue {
    Text(String),
    Bool(bool),
    Integer(i64),
    Bytes(Vec<u8>),
    List(Vec<CoreValue>),
    Map(BTreeMap<String, CoreValue>),
}

impl CoreValue {
    /// Short name of the variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Bytes(_) => "bytes",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[CoreValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, CoreValue>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Build a list of text values.
    pub fn text_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(|s| Self::Text(s.into())).collect())
    }
}

impl From<&str> for CoreValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CoreValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for CoreValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for CoreValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<u32> for CoreValue {
    fn from(n: u32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<Vec<u8>> for CoreValue {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<BTreeMap<String, CoreValue>> for CoreValue {
    fn from(m: BTreeMap<String, CoreValue>) -> Self {
        Self::Map(m)
    }
}

/// Foreign JSON input enters the canonical universe here. `null` and
/// non-integral numbers have no canonical binary form.
impl TryFrom<&serde_json::Value> for CoreValue {
    type Error = DidError;

    fn try_from(value: &serde_json::Value) -> Result<Self> {
        use serde_json::Value;
        match value {
            Value::Null => Err(DidError::UnsupportedValueType("null".into())),
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::Number(n) => n.as_i64().map(Self::Integer).ok_or_else(|| {
                DidError::UnsupportedValueType(format!("number {n} is not a 64-bit signed integer"))
            }),
            Value::String(s) => Ok(Self::Text(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(CoreValue::try_from)
                .collect::<Result<Vec<_>>>()
                .map(Self::List),
            Value::Object(obj) => obj
                .iter()
                .map(|(k, v)| Ok((k.clone(), CoreValue::try_from(v)?)))
                .collect::<Result<BTreeMap<_, _>>>()
                .map(Self::Map),
        }
    }
}
