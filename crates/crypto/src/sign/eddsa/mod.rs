// Path: crates/crypto/src/sign/eddsa/mod.rs
//! Ed25519 request signing via `ed25519-dalek`.

use crate::algorithms::hash::sha224;
use crate::error::CryptoError;
use ed25519_dalek::{Signer, Verifier};
use ica_api::crypto::{DerPublicKey, SerializableKey, Signature, VerifyingKey};
use ica_api::identity::Identity;
use ica_types::app::{Principal, SELF_AUTHENTICATING_TAG};
use rand::rngs::OsRng;

/// `SubjectPublicKeyInfo` prefix for an Ed25519 key (OID 1.3.101.112).
pub const ED25519_DER_PREFIX: [u8; 12] = [
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x03, 0x21, 0x00,
];

/// Ed25519 signature implementation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ed25519Signature(ed25519_dalek::Signature);

/// Ed25519 public key implementation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ed25519PublicKey(ed25519_dalek::VerifyingKey);

/// A signing identity holding an Ed25519 secret key.
///
/// The sender principal is self-authenticating: `sha224(der_public_key) || 0x02`.
pub struct Ed25519Identity {
    signing_key: ed25519_dalek::SigningKey,
    der_public_key: Vec<u8>,
    principal: Principal,
}

impl Ed25519Identity {
    /// Generate a fresh identity.
    pub fn generate() -> Self {
        Self::from_signing_key(ed25519_dalek::SigningKey::generate(&mut OsRng))
    }

    /// Restore an identity from its 32-byte seed.
    pub fn from_seed(seed: &[u8]) -> Result<Self, CryptoError> {
        let seed: [u8; 32] = seed.try_into().map_err(|_| CryptoError::InvalidLength {
            expected: 32,
            got: seed.len(),
        })?;
        Ok(Self::from_signing_key(ed25519_dalek::SigningKey::from_bytes(
            &seed,
        )))
    }

    fn from_signing_key(signing_key: ed25519_dalek::SigningKey) -> Self {
        let public_key = Ed25519PublicKey(signing_key.verifying_key());
        let der_public_key = public_key.to_der();
        let principal = self_authenticating_principal(&der_public_key);
        Self {
            signing_key,
            der_public_key,
            principal,
        }
    }

    /// The verifying half of this identity.
    pub fn verifying_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.signing_key.verifying_key())
    }
}

impl std::fmt::Debug for Ed25519Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519Identity")
            .field("principal", &self.principal)
            .finish_non_exhaustive()
    }
}

impl Identity for Ed25519Identity {
    fn sender(&self) -> Principal {
        self.principal
    }

    fn public_key(&self) -> Option<Vec<u8>> {
        Some(self.der_public_key.clone())
    }

    fn sign(&self, message: &[u8]) -> Result<Option<Vec<u8>>, CryptoError> {
        Ok(Some(self.signing_key.sign(message).to_bytes().to_vec()))
    }
}

/// Derives the self-authenticating principal for a DER-encoded public key.
pub fn self_authenticating_principal(der_public_key: &[u8]) -> Principal {
    let mut bytes = [0u8; 29];
    let (digest, tag) = bytes.split_at_mut(28);
    digest.copy_from_slice(&sha224(der_public_key));
    tag.fill(SELF_AUTHENTICATING_TAG);
    Principal::from_array(bytes)
}

impl VerifyingKey for Ed25519PublicKey {
    type Signature = Ed25519Signature;

    fn verify(&self, message: &[u8], signature: &Self::Signature) -> Result<(), CryptoError> {
        self.0
            .verify(message, &signature.0)
            .map_err(|_| CryptoError::VerificationFailed)
    }
}

impl SerializableKey for Ed25519PublicKey {
    fn to_bytes(&self) -> Vec<u8> {
        self.0.to_bytes().to_vec()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| CryptoError::InvalidLength {
            expected: 32,
            got: bytes.len(),
        })?;
        ed25519_dalek::VerifyingKey::from_bytes(&arr)
            .map(Ed25519PublicKey)
            .map_err(|e| CryptoError::InvalidKey(format!("Failed to parse public key: {e}")))
    }
}

impl DerPublicKey for Ed25519PublicKey {
    fn to_der(&self) -> Vec<u8> {
        let mut der = ED25519_DER_PREFIX.to_vec();
        der.extend_from_slice(self.0.as_bytes());
        der
    }

    fn from_der(der: &[u8]) -> Result<Self, CryptoError> {
        let raw = der
            .strip_prefix(&ED25519_DER_PREFIX[..])
            .ok_or_else(|| CryptoError::InvalidKey("missing Ed25519 DER prefix".into()))?;
        Self::from_bytes(raw)
    }
}

impl SerializableKey for Ed25519Signature {
    fn to_bytes(&self) -> Vec<u8> {
        self.0.to_bytes().to_vec()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        ed25519_dalek::Signature::from_slice(bytes)
            .map(Ed25519Signature)
            .map_err(|e| CryptoError::InvalidSignature(format!("Failed to parse signature: {e}")))
    }
}

impl Signature for Ed25519Signature {}

#[cfg(test)]
mod tests;
