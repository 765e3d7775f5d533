// Path: crates/state/src/certificate/tests.rs
use super::*;
use crate::tree::{label, leaf};
use ica_api::crypto::{DerPublicKey, SerializableKey};
use ica_candid::leb128::encode_unsigned;
use ica_crypto::sign::bls::BlsKeyPair;
use std::time::Duration;

const NOW_NS: u64 = 1_700_000_000_000_000_000;
const SKEW: Duration = Duration::from_secs(300);

fn now() -> Duration {
    Duration::from_nanos(NOW_NS)
}

fn principal(bytes: &[u8]) -> Principal {
    Principal::try_from_slice(bytes).unwrap()
}

fn canister() -> Principal {
    principal(&[0, 0, 0, 0, 0, 0, 0, 5, 1, 1])
}

fn subnet() -> Principal {
    principal(&[0xaa; 29])
}

fn signed(tree: HashTree, key: &BlsKeyPair, delegation: Option<Delegation>) -> Certificate {
    let signature = key.sign(&signed_message(&tree.digest())).to_bytes();
    Certificate {
        tree,
        signature,
        delegation,
    }
}

fn state_tree(time_ns: u64) -> HashTree {
    HashTree::from_labeled([
        ("request_status", label("abc", label("status", leaf("replied")))),
        ("time", leaf(encode_unsigned(time_ns))),
    ])
}

fn subnet_certificate(
    root: &BlsKeyPair,
    subnet_id: &Principal,
    subnet_key: &BlsKeyPair,
    ranges: &[(Principal, Principal)],
) -> Vec<u8> {
    let subnet_entry = HashTree::from_labeled([
        ("canister_ranges", leaf(encode_canister_ranges(ranges).unwrap())),
        ("public_key", leaf(subnet_key.public_key().to_der())),
    ]);
    let tree = HashTree::from_labeled([
        ("subnet", HashTree::from_labeled([(subnet_id.as_slice().to_vec(), subnet_entry)])),
        ("time", leaf(encode_unsigned(NOW_NS))),
    ]);
    signed(tree, root, None).to_cbor_bytes().unwrap()
}

fn verifier(root: &BlsKeyPair, max_depth: usize) -> CertificateVerifier {
    CertificateVerifier::with_limits(root.public_key().to_der(), max_depth, SKEW)
}

#[test]
fn test_direct_certificate_verifies() {
    let root = BlsKeyPair::from_seed(b"root");
    let cert = signed(state_tree(NOW_NS), &root, None);
    let bytes = cert.to_cbor_bytes().unwrap();

    let (parsed, verified) = verifier(&root, 1)
        .verify_bytes(&bytes, &canister(), now())
        .unwrap();
    assert_eq!(parsed, cert);
    assert_eq!(verified.time_ns, NOW_NS);
    assert_eq!(verified.delegation_depth, 0);
    assert_eq!(verified.root_hash, cert.root_hash());
    assert_eq!(
        parsed.lookup(&["request_status", "abc", "status"]),
        LookupResult::Found(b"replied")
    );
}

#[test]
fn test_signature_over_wrong_root_is_rejected() {
    let root = BlsKeyPair::from_seed(b"root");
    let mut cert = signed(state_tree(NOW_NS), &root, None);
    cert.signature = root
        .sign(&signed_message(&state_tree(NOW_NS + 1).digest()))
        .to_bytes();

    let err = verifier(&root, 1).verify(&cert, &canister(), now()).unwrap_err();
    assert!(matches!(err, CertificateError::Signature(_)), "{err:?}");
}

#[test]
fn test_signature_by_other_key_is_rejected() {
    let root = BlsKeyPair::from_seed(b"root");
    let impostor = BlsKeyPair::from_seed(b"impostor");
    let cert = signed(state_tree(NOW_NS), &impostor, None);
    assert!(matches!(
        verifier(&root, 1).verify(&cert, &canister(), now()),
        Err(CertificateError::Signature(_))
    ));
}

#[test]
fn test_time_outside_skew_window_is_expired() {
    let root = BlsKeyPair::from_seed(b"root");
    let skew_ns = SKEW.as_nanos() as u64;

    let future = signed(state_tree(NOW_NS + 10 * skew_ns), &root, None);
    let err = verifier(&root, 1).verify(&future, &canister(), now()).unwrap_err();
    assert!(matches!(err, CertificateError::Expired { .. }), "{err:?}");

    let stale = signed(state_tree(NOW_NS - 10 * skew_ns), &root, None);
    assert!(matches!(
        verifier(&root, 1).verify(&stale, &canister(), now()),
        Err(CertificateError::Expired { .. })
    ));

    let edge = signed(state_tree(NOW_NS + skew_ns), &root, None);
    assert!(verifier(&root, 1).verify(&edge, &canister(), now()).is_ok());
}

#[test]
fn test_missing_time_is_reported() {
    let root = BlsKeyPair::from_seed(b"root");
    let cert = signed(HashTree::from_labeled([("other", leaf("x"))]), &root, None);
    assert!(matches!(
        verifier(&root, 1).verify(&cert, &canister(), now()),
        Err(CertificateError::MissingPath(_))
    ));
}

#[test]
fn test_delegated_certificate_verifies() {
    let root = BlsKeyPair::from_seed(b"root");
    let subnet_key = BlsKeyPair::from_seed(b"subnet");
    let range = (principal(&[0, 0, 0, 0, 0, 0, 0, 0, 1, 1]), principal(&[0, 0, 0, 0, 0, 0, 0, 0xff, 1, 1]));
    let delegation = Delegation {
        subnet_id: subnet(),
        certificate: subnet_certificate(&root, &subnet(), &subnet_key, &[range]),
    };
    let cert = signed(state_tree(NOW_NS), &subnet_key, Some(delegation));
    let bytes = cert.to_cbor_bytes().unwrap();

    let (_, verified) = verifier(&root, 1)
        .verify_bytes(&bytes, &canister(), now())
        .unwrap();
    assert_eq!(verified.delegation_depth, 1);

    // Signing the outer certificate with the root key instead of the
    // delegated key must fail.
    let misdirected = signed(state_tree(NOW_NS), &root, cert.delegation.clone());
    assert!(matches!(
        verifier(&root, 1).verify(&misdirected, &canister(), now()),
        Err(CertificateError::Signature(_))
    ));
}

#[test]
fn test_canister_outside_delegated_range_is_rejected() {
    let root = BlsKeyPair::from_seed(b"root");
    let subnet_key = BlsKeyPair::from_seed(b"subnet");
    let range = (principal(&[0, 0, 0, 0, 0, 0, 0, 0x10, 1, 1]), principal(&[0, 0, 0, 0, 0, 0, 0, 0x20, 1, 1]));
    let delegation = Delegation {
        subnet_id: subnet(),
        certificate: subnet_certificate(&root, &subnet(), &subnet_key, &[range]),
    };
    let cert = signed(state_tree(NOW_NS), &subnet_key, Some(delegation));

    let err = verifier(&root, 1).verify(&cert, &canister(), now()).unwrap_err();
    assert!(
        matches!(err, CertificateError::CanisterRangeViolation { .. }),
        "{err:?}"
    );
}

#[test]
fn test_delegation_signed_by_wrong_root_is_rejected() {
    let root = BlsKeyPair::from_seed(b"root");
    let rogue = BlsKeyPair::from_seed(b"rogue");
    let subnet_key = BlsKeyPair::from_seed(b"subnet");
    let range = (canister(), canister());
    let delegation = Delegation {
        subnet_id: subnet(),
        certificate: subnet_certificate(&rogue, &subnet(), &subnet_key, &[range]),
    };
    let cert = signed(state_tree(NOW_NS), &subnet_key, Some(delegation));
    assert!(matches!(
        verifier(&root, 1).verify(&cert, &canister(), now()),
        Err(CertificateError::Signature(_))
    ));
}

/// A chain whose signatures are all garbage: the depth bound must trip
/// before any of them is looked at.
fn garbage_chain(subnets: &[Principal]) -> Certificate {
    let mut delegation = None;
    for subnet_id in subnets.iter().rev() {
        let inner = Certificate {
            tree: HashTree::from_labeled([("time", leaf(encode_unsigned(NOW_NS)))]),
            signature: vec![0; 48],
            delegation: delegation.take(),
        };
        delegation = Some(Delegation {
            subnet_id: *subnet_id,
            certificate: inner.to_cbor_bytes().unwrap(),
        });
    }
    Certificate {
        tree: state_tree(NOW_NS),
        signature: vec![0; 48],
        delegation,
    }
}

#[test]
fn test_delegation_depth_bound() {
    let root = BlsKeyPair::from_seed(b"root");
    let cert = garbage_chain(&[principal(&[1]), principal(&[2])]);
    assert_eq!(
        verifier(&root, 1).verify(&cert, &canister(), now()),
        Err(CertificateError::DelegationDepthExceeded { depth: 2, max: 1 })
    );

    let deeper = garbage_chain(&[principal(&[1]), principal(&[2]), principal(&[3]), principal(&[4])]);
    assert_eq!(
        verifier(&root, 3).verify(&deeper, &canister(), now()),
        Err(CertificateError::DelegationDepthExceeded { depth: 4, max: 3 })
    );
}

#[test]
fn test_delegation_cycle_is_rejected() {
    let root = BlsKeyPair::from_seed(b"root");
    let cert = garbage_chain(&[principal(&[1]), principal(&[2]), principal(&[1])]);
    assert!(matches!(
        verifier(&root, 5).verify(&cert, &canister(), now()),
        Err(CertificateError::DelegationCycle(_))
    ));
}

#[test]
fn test_malformed_inputs() {
    assert!(matches!(
        Certificate::from_cbor_bytes(b"not cbor"),
        Err(CertificateError::Malformed(_))
    ));
    let no_signature = to_cbor_bytes(&text_map([("tree", HashTree::Empty.to_cbor())])).unwrap();
    assert!(matches!(
        Certificate::from_cbor_bytes(&no_signature),
        Err(CertificateError::Malformed(_))
    ));
    assert!(parse_canister_ranges(&to_cbor_bytes(&Value::Text("x".into())).unwrap()).is_err());
}
