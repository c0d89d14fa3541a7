use canon_json::{canonical_value_bytes, to_canonical_vec};
use proptest::prelude::*;
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Strategy: arbitrary JSON values (finite numbers only)
// ---------------------------------------------------------------------------

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        (-1.0e9f64..1.0e9f64).prop_map(Value::from),
        "[a-zA-Z0-9 _\"\\\\]{0,16}".prop_map(Value::String),
    ];

    leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            proptest::collection::vec(("[a-z]{1,6}", inner), 0..4).prop_map(|pairs| {
                let mut m = Map::new();
                for (k, v) in pairs {
                    m.insert(k, v);
                }
                Value::Object(m)
            }),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn canonical_bytes_reparse_to_same_bytes(v in arb_json()) {
        let first = canonical_value_bytes(&v).expect("finite values encode");
        let reparsed: Value = serde_json::from_slice(&first).expect("canonical output is JSON");
        let second = canonical_value_bytes(&reparsed).expect("reparsed value encodes");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn key_insertion_order_is_irrelevant(pairs in proptest::collection::vec(("[a-z]{1,6}", any::<i64>()), 0..8)) {
        let mut forward = Map::new();
        for (k, v) in &pairs {
            forward.insert(k.clone(), Value::from(*v));
        }
        let mut backward = Map::new();
        for (k, _) in pairs.iter().rev() {
            if let Some(v) = forward.get(k) {
                backward.insert(k.clone(), v.clone());
            }
        }
        prop_assert_eq!(
            to_canonical_vec(&Value::Object(forward)).unwrap(),
            to_canonical_vec(&Value::Object(backward)).unwrap()
        );
    }

    #[test]
    fn any_string_survives_canonical_escaping(s in any::<String>()) {
        let bytes = to_canonical_vec(&s).unwrap();
        let back: String = serde_json::from_slice(&bytes).expect("canonical string is JSON");
        prop_assert_eq!(back, s);
    }
}
