// Path: crates/api/src/identity/mod.rs

//! Defines the `Identity` trait for decoupled request signing.

use crate::error::CryptoError;
use ica_types::app::Principal;

/// A request signer.
///
/// Implementations are opaque byte-producing capabilities: the agent asks for
/// the sender principal, the DER-encoded public key, and a signature over an
/// already domain-separated message. Key storage is the implementor's concern.
pub trait Identity: Send + Sync {
    /// The principal requests are sent as.
    fn sender(&self) -> Principal;

    /// The DER-encoded public key, or `None` for unsigned (anonymous) requests.
    fn public_key(&self) -> Option<Vec<u8>>;

    /// Signs `message`, or returns `None` when the identity does not sign.
    fn sign(&self, message: &[u8]) -> Result<Option<Vec<u8>>, CryptoError>;
}

/// The anonymous identity: sends as `2vxsx-fae` and never signs.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousIdentity;

impl Identity for AnonymousIdentity {
    fn sender(&self) -> Principal {
        Principal::anonymous()
    }

    fn public_key(&self) -> Option<Vec<u8>> {
        None
    }

    fn sign(&self, _message: &[u8]) -> Result<Option<Vec<u8>>, CryptoError> {
        Ok(None)
    }
}
