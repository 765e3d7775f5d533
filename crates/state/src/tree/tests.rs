// Path: crates/state/src/tree/tests.rs
use super::*;
use ica_types::codec::{from_cbor_bytes, to_cbor_bytes};
use proptest::prelude::*;

/// The worked example tree of the replica interface documentation.
fn sample_tree() -> HashTree {
    fork(
        fork(
            label(
                "a",
                fork(
                    fork(label("x", leaf("hello")), empty()),
                    label("y", leaf("world")),
                ),
            ),
            label("b", leaf("good")),
        ),
        fork(label("c", empty()), label("d", leaf("morning"))),
    )
}

#[test]
fn test_root_hash_matches_reference_vector() {
    assert_eq!(
        hex::encode(sample_tree().digest()),
        "eb5c5b2195e62d996b84c9bcc8259d19a83786a2f59e0878cec84c811f669aa0"
    );
}

#[test]
fn test_lookup_found_absent_error() {
    let tree = sample_tree();
    assert_eq!(tree.lookup_path(&["a", "x"]), LookupResult::Found(b"hello"));
    assert_eq!(tree.lookup_path(&["a", "y"]), LookupResult::Found(b"world"));
    assert_eq!(tree.lookup_path(&["d"]), LookupResult::Found(b"morning"));
    assert_eq!(tree.lookup_path(&["a", "z"]), LookupResult::Absent);
    assert_eq!(tree.lookup_path(&["aa"]), LookupResult::Absent);
    assert_eq!(tree.lookup_path(&["e"]), LookupResult::Absent);
    assert_eq!(tree.lookup_path(&["0"]), LookupResult::Absent);
    assert_eq!(tree.lookup_path(&["c"]), LookupResult::Absent);
    assert_eq!(tree.lookup_path(&["a"]), LookupResult::Error);
}

#[test]
fn test_pruned_node_on_path_is_unknown() {
    let tree = sample_tree().prune_path(&["b"]);
    assert_eq!(tree.digest(), sample_tree().digest());
    assert_eq!(tree.lookup_path(&["b"]), LookupResult::Unknown);
    // Siblings stay provable.
    assert_eq!(tree.lookup_path(&["a", "x"]), LookupResult::Found(b"hello"));

    let only_child = fork(label("a", leaf("1")), pruned([7u8; 32]));
    assert_eq!(only_child.lookup_path(&["b"]), LookupResult::Unknown);
    assert_eq!(only_child.lookup_path(&["0"]), LookupResult::Absent);
}

#[test]
fn test_removed_leaf_is_absent() {
    let tree = fork(label("a", empty()), label("b", leaf("2")));
    assert_eq!(tree.lookup_path(&["a"]), LookupResult::Absent);
}

#[test]
fn test_from_labeled_sorts_and_balances() {
    let tree = HashTree::from_labeled([
        ("d", leaf("4")),
        ("a", leaf("1")),
        ("c", leaf("3")),
        ("b", leaf("0")),
        ("b", leaf("2")),
    ]);
    for (l, v) in [("a", "1"), ("b", "2"), ("c", "3"), ("d", "4")] {
        assert_eq!(tree.lookup_path(&[l]), LookupResult::Found(v.as_bytes()));
    }
    assert_eq!(
        tree,
        fork(
            fork(label("a", leaf("1")), label("b", leaf("2"))),
            fork(label("c", leaf("3")), label("d", leaf("4"))),
        )
    );
    assert_eq!(HashTree::from_labeled(Vec::<(&str, HashTree)>::new()), empty());
}

#[test]
fn test_cbor_roundtrip_and_rejects() {
    let tree = sample_tree().prune_path(&["a", "y"]);
    let bytes = to_cbor_bytes(&tree.to_cbor()).unwrap();
    let back = HashTree::from_cbor(&from_cbor_bytes(&bytes).unwrap()).unwrap();
    assert_eq!(back, tree);

    let bad = ciborium::value::Value::Array(vec![
        ciborium::value::Value::Integer(4u64.into()),
        ciborium::value::Value::Bytes(vec![0; 31]),
    ]);
    assert!(matches!(
        HashTree::from_cbor(&bad),
        Err(CertificateError::Malformed(_))
    ));
    let unknown_tag = ciborium::value::Value::Array(vec![ciborium::value::Value::Integer(9u64.into())]);
    assert!(HashTree::from_cbor(&unknown_tag).is_err());
}

fn arb_tree() -> impl Strategy<Value = HashTree> {
    let leaf_node = prop_oneof![
        Just(empty()),
        proptest::collection::vec(any::<u8>(), 0..8).prop_map(|v| leaf(v)),
        any::<[u8; 32]>().prop_map(pruned),
    ];
    leaf_node.prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(l, r)| fork(l, r)),
            (proptest::collection::vec(any::<u8>(), 0..4), inner).prop_map(|(l, t)| label(l, t)),
        ]
    })
}

proptest! {
    #[test]
    fn prop_cbor_preserves_digest(tree in arb_tree()) {
        let back = HashTree::from_cbor(&tree.to_cbor()).unwrap();
        prop_assert_eq!(back.digest(), tree.digest());
    }

    #[test]
    fn prop_pruning_preserves_digest(tree in arb_tree(), l in proptest::collection::vec(any::<u8>(), 0..4)) {
        let digest = tree.digest();
        prop_assert_eq!(tree.prune_path(&[l]).digest(), digest);
    }
}
