// Path: crates/state/src/certificate/mod.rs
//! Certificates: a hash tree, a BLS signature over its root, and an optional
//! delegation from the root key to a subnet key.

mod verify;

pub use verify::{CertificateVerifier, Verified};

use crate::tree::{Digest, HashTree, LookupResult};
use ciborium::value::Value;
use ica_candid::leb128::decode_unsigned;
use ica_types::app::Principal;
use ica_types::codec::{from_cbor_bytes, map_get, text_map, to_cbor_bytes};
use ica_types::error::CertificateError;

/// Separator of the message a certificate signature covers.
pub const STATE_ROOT_DOMAIN: &[u8] = b"ic-state-root";

/// A signed hash tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub tree: HashTree,
    pub signature: Vec<u8>,
    pub delegation: Option<Delegation>,
}

/// Authorises a subnet key to sign for a range of canisters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delegation {
    pub subnet_id: Principal,
    /// The CBOR-encoded certificate, signed one level closer to the root,
    /// whose tree holds the subnet's public key and canister ranges.
    pub certificate: Vec<u8>,
}

impl Certificate {
    /// Parses a CBOR certificate, with or without the self-describing tag.
    pub fn from_cbor_bytes(bytes: &[u8]) -> Result<Self, CertificateError> {
        let value = from_cbor_bytes(bytes).map_err(CertificateError::Malformed)?;
        Self::from_cbor(&value)
    }

    fn from_cbor(value: &Value) -> Result<Self, CertificateError> {
        let tree = map_get(value, "tree")
            .ok_or_else(|| malformed("certificate has no tree"))
            .and_then(HashTree::from_cbor)?;
        let signature = map_get(value, "signature")
            .and_then(Value::as_bytes)
            .cloned()
            .ok_or_else(|| malformed("certificate has no signature"))?;
        let delegation = match map_get(value, "delegation") {
            None | Some(Value::Null) => None,
            Some(d) => Some(Delegation::from_cbor(d)?),
        };
        Ok(Self {
            tree,
            signature,
            delegation,
        })
    }

    /// Encodes the certificate as tagged CBOR.
    pub fn to_cbor_bytes(&self) -> Result<Vec<u8>, CertificateError> {
        let mut entries = vec![
            ("tree", self.tree.to_cbor()),
            ("signature", Value::Bytes(self.signature.clone())),
        ];
        if let Some(delegation) = &self.delegation {
            entries.push(("delegation", delegation.to_cbor()));
        }
        to_cbor_bytes(&text_map(entries)).map_err(CertificateError::Malformed)
    }

    /// The root digest of the certified tree.
    pub fn root_hash(&self) -> Digest {
        self.tree.digest()
    }

    /// The message the signature must cover.
    pub fn signed_message(&self) -> Vec<u8> {
        signed_message(&self.root_hash())
    }

    pub fn lookup<P: AsRef<[u8]>>(&self, path: &[P]) -> LookupResult<'_> {
        self.tree.lookup_path(path)
    }

    /// The certified `time` leaf, in nanoseconds since the epoch.
    pub fn time_ns(&self) -> Result<u64, CertificateError> {
        match self.lookup(&["time"]) {
            LookupResult::Found(bytes) => {
                let (time, read) = decode_unsigned(bytes, 0)
                    .map_err(|e| malformed(&format!("time leaf: {e}")))?;
                if read != bytes.len() {
                    return Err(malformed("time leaf has trailing bytes"));
                }
                Ok(time)
            }
            _ => Err(CertificateError::MissingPath("/time".into())),
        }
    }
}

impl Delegation {
    fn from_cbor(value: &Value) -> Result<Self, CertificateError> {
        let subnet_id = map_get(value, "subnet_id")
            .and_then(Value::as_bytes)
            .ok_or_else(|| malformed("delegation has no subnet_id"))?;
        let subnet_id = Principal::try_from_slice(subnet_id)
            .map_err(|e| malformed(&format!("delegation subnet_id: {e}")))?;
        let certificate = map_get(value, "certificate")
            .and_then(Value::as_bytes)
            .cloned()
            .ok_or_else(|| malformed("delegation has no certificate"))?;
        Ok(Self {
            subnet_id,
            certificate,
        })
    }

    fn to_cbor(&self) -> Value {
        text_map([
            ("subnet_id", Value::Bytes(self.subnet_id.as_slice().to_vec())),
            ("certificate", Value::Bytes(self.certificate.clone())),
        ])
    }
}

/// `"\x0Dic-state-root" || root_hash`
pub fn signed_message(root_hash: &Digest) -> Vec<u8> {
    let mut message = Vec::with_capacity(1 + STATE_ROOT_DOMAIN.len() + root_hash.len());
    message.push(STATE_ROOT_DOMAIN.len() as u8);
    message.extend_from_slice(STATE_ROOT_DOMAIN);
    message.extend_from_slice(root_hash);
    message
}

/// Parses a `canister_ranges` leaf: a CBOR list of inclusive `[low, high]`
/// principal pairs.
pub fn parse_canister_ranges(bytes: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, CertificateError> {
    let value = from_cbor_bytes(bytes).map_err(CertificateError::Malformed)?;
    let ranges = value
        .as_array()
        .ok_or_else(|| malformed("canister_ranges is not an array"))?;
    ranges
        .iter()
        .map(|range| match range.as_array().map(Vec::as_slice) {
            Some([Value::Bytes(low), Value::Bytes(high)]) => Ok((low.clone(), high.clone())),
            _ => Err(malformed("canister range is not a [low, high] pair")),
        })
        .collect()
}

/// Encodes canister ranges in the `canister_ranges` leaf format.
pub fn encode_canister_ranges(ranges: &[(Principal, Principal)]) -> Result<Vec<u8>, CertificateError> {
    let value = Value::Array(
        ranges
            .iter()
            .map(|(low, high)| {
                Value::Array(vec![
                    Value::Bytes(low.as_slice().to_vec()),
                    Value::Bytes(high.as_slice().to_vec()),
                ])
            })
            .collect(),
    );
    to_cbor_bytes(&value).map_err(CertificateError::Malformed)
}

fn malformed(msg: &str) -> CertificateError {
    CertificateError::Malformed(msg.to_string())
}

#[cfg(test)]
mod tests;
