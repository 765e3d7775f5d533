// Path: crates/api/src/crypto/mod.rs
//! Defines unified traits for the cryptographic keys the agent handles.
//!
//! The agent verifies (BLS certificates) far more than it signs; signing is
//! delegated to an [`Identity`](crate::identity::Identity).

use crate::error::CryptoError;

/// A trait for any key or signature that can be serialized to and from raw bytes.
pub trait SerializableKey {
    /// Converts the key to its raw (compressed) byte form.
    fn to_bytes(&self) -> Vec<u8>;

    /// Creates a key from its raw byte form.
    fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError>
    where
        Self: Sized;
}

/// A public key that travels DER-framed (`SubjectPublicKeyInfo`) on the wire,
/// as root keys, delegated subnet keys and sender keys do.
pub trait DerPublicKey: SerializableKey {
    /// Wraps the raw key in its algorithm's DER prefix.
    fn to_der(&self) -> Vec<u8>;

    /// Strips and checks the DER prefix, then parses the raw key.
    fn from_der(der: &[u8]) -> Result<Self, CryptoError>
    where
        Self: Sized;
}

/// A trait for a public key used for signature verification.
pub trait VerifyingKey: SerializableKey {
    /// The signature type that this key can verify.
    type Signature: Signature;
    /// Verifies a signature against a message.
    fn verify(&self, message: &[u8], signature: &Self::Signature) -> Result<(), CryptoError>;
}

/// A marker trait for a cryptographic signature.
pub trait Signature: SerializableKey {}
