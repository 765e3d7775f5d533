// Path: crates/api/src/lib.rs

//! # ICA API Crate Lints
//!
//! This crate enforces a strict set of lints to ensure high-quality,
//! panic-free, and well-documented code. Panics are disallowed in non-test
//! code to promote robust error handling.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::indexing_slicing
    )
)]
//! # ICA API
//!
//! Core traits for the ICA agent. This crate defines the stable contract
//! between the protocol engine and its external collaborators: the network
//! transport, the request signer, and the clock used to drive polling.

/// Defines unified traits for cryptographic keys and signatures.
pub mod crypto;
/// Re-exports all core error types from the central `ica-types` crate.
pub mod error;
/// Defines the `Identity` trait implemented by request signers.
pub mod identity;
/// Defines the `Scheduler` trait used to suspend the polling loop.
pub mod scheduler;
/// Defines the `Transport` trait for talking to a replica.
pub mod transport;

/// A curated set of the most commonly used traits and types.
pub mod prelude {
    pub use crate::crypto::{DerPublicKey, SerializableKey, Signature, VerifyingKey};
    pub use crate::error::{AgentError, CryptoError, ErrorCode, TransportError};
    pub use crate::identity::{AnonymousIdentity, Identity};
    pub use crate::scheduler::{Scheduler, TokioScheduler};
    pub use crate::transport::Transport;
}
