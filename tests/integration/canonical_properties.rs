//! Property tests for the canonical encodings and content addressing.

use std::collections::BTreeMap;

use proptest::prelude::*;
use serde_json::Value;

use pqdid::canonical::{cbor, json};
use pqdid::{compute_cid, encode_core, CoreValue, DidError};

fn core_value() -> impl Strategy<Value = CoreValue> {
    let leaf = prop_oneof![
        "[a-zA-Z0-9 _é€-]{0,12}".prop_map(CoreValue::Text),
        any::<bool>().prop_map(CoreValue::Bool),
        (-(u32::MAX as i64) - 1..=u32::MAX as i64).prop_map(CoreValue::Integer),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(CoreValue::Bytes),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(CoreValue::List),
            prop::collection::btree_map("[a-zA-Z]{1,6}", inner, 0..6).prop_map(CoreValue::Map),
        ]
    })
}

fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        (-1.0e9f64..1.0e9).prop_map(Value::from),
        any::<String>().prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec((any::<String>(), inner), 0..6)
                .prop_map(|members| Value::Object(members.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn cbor_encoding_is_deterministic(value in core_value()) {
        let a = cbor::encode(&value).unwrap();
        let b = cbor::encode(&value.clone()).unwrap();
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(compute_cid(&a), compute_cid(&b));
    }

    #[test]
    fn cbor_decode_inverts_encode(value in core_value()) {
        let bytes = cbor::encode(&value).unwrap();
        prop_assert_eq!(cbor::decode(&bytes).unwrap(), value);
    }

    #[test]
    fn map_insertion_order_is_irrelevant(
        entries in prop::collection::vec(("[a-z]{1,8}", core_value()), 1..8)
    ) {
        let mut unique: Vec<(String, CoreValue)> = Vec::new();
        for (k, v) in entries {
            unique.retain(|(existing, _)| *existing != k);
            unique.push((k, v));
        }
        let forward: BTreeMap<String, CoreValue> = unique.iter().cloned().collect();
        let reverse: BTreeMap<String, CoreValue> = unique.into_iter().rev().collect();
        let (bytes_a, cid_a) = encode_core(&CoreValue::Map(forward)).unwrap();
        let (bytes_b, cid_b) = encode_core(&CoreValue::Map(reverse)).unwrap();
        prop_assert_eq!(bytes_a, bytes_b);
        prop_assert_eq!(cid_a, cid_b);
    }

    #[test]
    fn single_bit_flip_changes_cid(
        bytes in prop::collection::vec(any::<u8>(), 1..256),
        index in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let original = compute_cid(&bytes);
        let mut flipped = bytes.clone();
        let i = index.index(flipped.len());
        flipped[i] ^= 1 << bit;
        prop_assert_ne!(compute_cid(&flipped), original);
    }

    #[test]
    fn integers_beyond_32_bits_are_rejected(n in (u32::MAX as i64 + 1)..i64::MAX) {
        prop_assert!(matches!(
            cbor::encode(&CoreValue::Integer(n)),
            Err(DidError::UnsupportedValueType(_))
        ));
        prop_assert!(matches!(
            cbor::encode(&CoreValue::Integer(-n - 1)),
            Err(DidError::UnsupportedValueType(_))
        ));
    }

    #[test]
    fn canonical_json_is_idempotent(value in json_value()) {
        let once = json::canonicalize(&value).unwrap();
        let reparsed: Value = serde_json::from_slice(&once).unwrap();
        let twice = json::canonicalize(&reparsed).unwrap();
        prop_assert_eq!(once, twice);
    }
}
