// Path: crates/api/src/transport/mod.rs

//! Defines the `Transport` trait, the agent's only path to the network.

use crate::error::TransportError;
use async_trait::async_trait;
use ica_types::app::Principal;

/// A replica endpoint that accepts CBOR envelopes.
///
/// The agent never performs socket I/O itself. Implementations own connection
/// pooling and HTTP framing; each method receives an already signed envelope
/// and the effective canister id used for routing.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Submits a `call` envelope. `Ok` means the replica accepted it for
    /// processing (HTTP 202).
    async fn call(
        &self,
        effective_canister_id: Principal,
        envelope: Vec<u8>,
    ) -> Result<(), TransportError>;

    /// Submits a `read_state` envelope and returns the raw CBOR certificate
    /// bytes extracted from the response.
    async fn read_state(
        &self,
        effective_canister_id: Principal,
        envelope: Vec<u8>,
    ) -> Result<Vec<u8>, TransportError>;

    /// Submits a `query` envelope and returns the raw CBOR response body.
    async fn query(
        &self,
        effective_canister_id: Principal,
        envelope: Vec<u8>,
    ) -> Result<Vec<u8>, TransportError>;
}
