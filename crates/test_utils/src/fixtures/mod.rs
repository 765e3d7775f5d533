// Path: crates/test_utils/src/fixtures/mod.rs
//! Certificate fixtures signed with real BLS keys.

use ica_api::crypto::{DerPublicKey, SerializableKey};
use ica_candid::leb128::encode_unsigned;
use ica_client::CallState;
use ica_crypto::sign::bls::BlsKeyPair;
use ica_state::certificate::{encode_canister_ranges, signed_message};
use ica_state::tree::{leaf, HashTree};
use ica_state::{Certificate, Delegation};
use ica_types::app::Principal;
use ica_types::MAX_PRINCIPAL_BYTES;
use ica_types::error::CertificateError;
use std::time::Duration;

/// 2023-11-14T22:13:20Z, the epoch every fixture clock starts at.
pub const GENESIS: Duration = Duration::from_secs(1_700_000_000);

/// The canister the fixtures talk to.
pub fn canister_id() -> Principal {
    Principal::try_from_slice(&[0, 0, 0, 0, 0, 0, 0, 1, 1, 1])
        .unwrap_or_else(|_| Principal::management_canister())
}

/// The subnet fixtures delegate to.
pub fn subnet_id() -> Principal {
    Principal::from_array([0x5a; MAX_PRINCIPAL_BYTES])
}

/// The `time` leaf for `now`.
pub fn time_leaf(now: Duration) -> HashTree {
    leaf(encode_unsigned(u64::try_from(now.as_nanos()).unwrap_or(u64::MAX)))
}

/// Signs `tree` with `key`.
pub fn sign_tree(tree: HashTree, key: &BlsKeyPair, delegation: Option<Delegation>) -> Certificate {
    let signature = key.sign(&signed_message(&tree.digest())).to_bytes();
    Certificate {
        tree,
        signature,
        delegation,
    }
}

/// The `/request_status/<id>` entries a replica certifies for `state`.
///
/// `Submitted` and `Unknown` have no certified form and yield `None`.
pub fn status_subtree(state: &CallState) -> Option<HashTree> {
    let entries = match state {
        CallState::Submitted | CallState::Unknown => return None,
        CallState::Processing => vec![("status", leaf("processing"))],
        CallState::Replied(reply) => vec![
            ("status", leaf("replied")),
            ("reply", leaf(reply.clone())),
        ],
        CallState::Rejected {
            code,
            message,
            error_code,
        } => {
            let mut entries = vec![
                ("status", leaf("rejected")),
                ("reject_code", leaf(encode_unsigned(code.as_u64()))),
                ("reject_message", leaf(message.as_str())),
            ];
            if let Some(error_code) = error_code {
                entries.push(("error_code", leaf(error_code.as_str())));
            }
            entries
        }
        CallState::Done => vec![("status", leaf("done"))],
    };
    Some(HashTree::from_labeled(entries))
}

/// A subnet key together with the root-signed certificate delegating to it.
#[derive(Clone)]
pub struct SubnetDelegation {
    pub subnet_id: Principal,
    pub key: BlsKeyPair,
    pub delegation: Delegation,
}

impl SubnetDelegation {
    /// Delegates `ranges` from `root` to a fresh subnet key, certified at
    /// `time`.
    pub fn new(
        root: &BlsKeyPair,
        subnet_id: Principal,
        key: BlsKeyPair,
        ranges: &[(Principal, Principal)],
        time: Duration,
    ) -> Result<Self, CertificateError> {
        let subnet_entry = HashTree::from_labeled([
            ("canister_ranges", leaf(encode_canister_ranges(ranges)?)),
            ("public_key", leaf(key.public_key().to_der())),
        ]);
        let tree = HashTree::from_labeled([
            (
                b"subnet".to_vec(),
                HashTree::from_labeled([(subnet_id.as_slice().to_vec(), subnet_entry)]),
            ),
            (b"time".to_vec(), time_leaf(time)),
        ]);
        let certificate = sign_tree(tree, root, None).to_cbor_bytes()?;
        Ok(Self {
            subnet_id,
            key,
            delegation: Delegation {
                subnet_id,
                certificate,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ica_state::CertificateVerifier;

    #[test]
    fn test_fixture_certificates_verify() {
        let root = BlsKeyPair::from_seed(b"fixture-root");
        let subnet = SubnetDelegation::new(
            &root,
            subnet_id(),
            BlsKeyPair::from_seed(b"fixture-subnet"),
            &[(canister_id(), canister_id())],
            GENESIS,
        )
        .unwrap();
        let cert = sign_tree(
            HashTree::from_labeled([("time", time_leaf(GENESIS))]),
            &subnet.key,
            Some(subnet.delegation.clone()),
        );
        let verifier = CertificateVerifier::with_limits(
            root.public_key().to_der(),
            1,
            Duration::from_secs(60),
        );
        let verified = verifier.verify(&cert, &canister_id(), GENESIS).unwrap();
        assert_eq!(verified.delegation_depth, 1);
    }

    #[test]
    fn test_status_subtree_round_trips_through_lookup() {
        let id = ica_types::app::RequestId([3; 32]);
        let rejected = CallState::Rejected {
            code: ica_types::app::RejectCode::CanisterReject,
            message: "nope".into(),
            error_code: Some("IC0406".into()),
        };
        let cert = Certificate {
            tree: ica_state::tree::label(
                "request_status",
                ica_state::tree::label(id.as_ref().to_vec(), status_subtree(&rejected).unwrap()),
            ),
            signature: vec![],
            delegation: None,
        };
        assert_eq!(ica_client::lookup_request_status(&cert, &id).unwrap(), rejected);
        assert!(status_subtree(&CallState::Unknown).is_none());
    }
}
