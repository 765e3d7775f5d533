// Path: crates/state/src/certificate/verify.rs
use super::{parse_canister_ranges, Certificate, Delegation};
use crate::tree::{Digest, LookupResult};
use ica_crypto::sign::bls::verify_der;
use ica_types::app::Principal;
use ica_types::config::AgentConfig;
use ica_types::error::{CertificateError, CryptoError};
use std::collections::BTreeSet;
use std::time::Duration;

/// What a successful verification established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verified {
    /// The certified `time` of the outermost certificate.
    pub time_ns: u64,
    /// The root hash covered by the outermost signature.
    pub root_hash: Digest,
    /// Number of delegations between the certificate and the root key.
    pub delegation_depth: usize,
}

/// Verifies certificates against a fixed root key.
///
/// The delegation chain is unwound iteratively: every link is parsed and
/// bounded before any signature is checked, so an adversarial chain costs at
/// most `max_delegation_depth` parses.
#[derive(Debug, Clone)]
pub struct CertificateVerifier {
    root_key: Vec<u8>,
    max_delegation_depth: usize,
    allowed_skew: Duration,
}

impl CertificateVerifier {
    /// A verifier for the DER-framed `root_key` using the limits in `config`.
    pub fn new(root_key: impl Into<Vec<u8>>, config: &AgentConfig) -> Self {
        Self::with_limits(
            root_key,
            config.max_delegation_depth,
            config.allowed_clock_skew(),
        )
    }

    pub fn with_limits(
        root_key: impl Into<Vec<u8>>,
        max_delegation_depth: usize,
        allowed_skew: Duration,
    ) -> Self {
        Self {
            root_key: root_key.into(),
            max_delegation_depth,
            allowed_skew,
        }
    }

    pub fn root_key(&self) -> &[u8] {
        &self.root_key
    }

    /// Parses and verifies a CBOR certificate.
    pub fn verify_bytes(
        &self,
        bytes: &[u8],
        canister_id: &Principal,
        now: Duration,
    ) -> Result<(Certificate, Verified), CertificateError> {
        let certificate = Certificate::from_cbor_bytes(bytes)?;
        let verified = self.verify(&certificate, canister_id, now)?;
        Ok((certificate, verified))
    }

    /// Verifies `certificate` as a statement about `canister_id` at time `now`
    /// (since the Unix epoch).
    pub fn verify(
        &self,
        certificate: &Certificate,
        canister_id: &Principal,
        now: Duration,
    ) -> Result<Verified, CertificateError> {
        let links = self.unwind(certificate)?;

        let mut key = self.root_key.clone();
        for (delegation, inner) in links.iter().rev() {
            check_signature(inner, &key)?;
            check_canister_range(inner, delegation, canister_id)?;
            key = delegated_key(inner, &delegation.subnet_id)?;
            tracing::debug!(
                target: "certificate",
                subnet = %delegation.subnet_id,
                "delegation verified"
            );
        }
        check_signature(certificate, &key)?;

        let time_ns = certificate.time_ns()?;
        self.check_time(time_ns, now)?;

        Ok(Verified {
            time_ns,
            root_hash: certificate.root_hash(),
            delegation_depth: links.len(),
        })
    }

    /// Collects `(delegation, inner certificate)` pairs, outermost first.
    fn unwind(
        &self,
        certificate: &Certificate,
    ) -> Result<Vec<(Delegation, Certificate)>, CertificateError> {
        let mut links = Vec::new();
        let mut visited = BTreeSet::new();
        let mut next = certificate.delegation.clone();
        while let Some(delegation) = next.take() {
            let depth = links.len() + 1;
            if depth > self.max_delegation_depth {
                return Err(CertificateError::DelegationDepthExceeded {
                    depth,
                    max: self.max_delegation_depth,
                });
            }
            if !visited.insert(delegation.subnet_id) {
                return Err(CertificateError::DelegationCycle(
                    delegation.subnet_id.to_text(),
                ));
            }
            let inner = Certificate::from_cbor_bytes(&delegation.certificate)?;
            next = inner.delegation.clone();
            links.push((delegation, inner));
        }
        Ok(links)
    }

    fn check_time(&self, time_ns: u64, now: Duration) -> Result<(), CertificateError> {
        let now_ns = u64::try_from(now.as_nanos()).unwrap_or(u64::MAX);
        let skew_ns = u64::try_from(self.allowed_skew.as_nanos()).unwrap_or(u64::MAX);
        if time_ns.abs_diff(now_ns) > skew_ns {
            return Err(CertificateError::Expired {
                certificate_time_ns: time_ns,
                now_ns,
                skew_ns,
            });
        }
        Ok(())
    }
}

fn check_signature(certificate: &Certificate, der_key: &[u8]) -> Result<(), CertificateError> {
    verify_der(der_key, &certificate.signed_message(), &certificate.signature).map_err(|e| match e {
        CryptoError::VerificationFailed => CertificateError::Signature(format!(
            "signature does not cover root hash {}",
            hex::encode(certificate.root_hash())
        )),
        CryptoError::InvalidSignature(_) | CryptoError::InvalidLength { .. } => {
            CertificateError::Signature(e.to_string())
        }
        other => CertificateError::Malformed(format!("signing key: {other}")),
    })
}

fn check_canister_range(
    inner: &Certificate,
    delegation: &Delegation,
    canister_id: &Principal,
) -> Result<(), CertificateError> {
    let subnet = delegation.subnet_id.as_slice();
    let path: [&[u8]; 3] = [b"subnet", subnet, b"canister_ranges"];
    let ranges = match inner.lookup(&path) {
        LookupResult::Found(bytes) => parse_canister_ranges(bytes)?,
        _ => {
            return Err(CertificateError::MissingPath(format!(
                "/subnet/{}/canister_ranges",
                delegation.subnet_id
            )))
        }
    };
    let canister = canister_id.as_slice();
    if ranges
        .iter()
        .any(|(low, high)| low.as_slice() <= canister && canister <= high.as_slice())
    {
        Ok(())
    } else {
        Err(CertificateError::CanisterRangeViolation {
            canister_id: canister_id.to_text(),
            subnet_id: delegation.subnet_id.to_text(),
        })
    }
}

fn delegated_key(inner: &Certificate, subnet_id: &Principal) -> Result<Vec<u8>, CertificateError> {
    let path: [&[u8]; 3] = [b"subnet", subnet_id.as_slice(), b"public_key"];
    match inner.lookup(&path) {
        LookupResult::Found(key) => Ok(key.to_vec()),
        _ => Err(CertificateError::MissingPath(format!(
            "/subnet/{subnet_id}/public_key"
        ))),
    }
}
