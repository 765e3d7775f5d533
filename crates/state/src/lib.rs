// Path: crates/state/src/lib.rs
//! # ICA State Crate Lints
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
        clippy::indexing_slicing
    )
)]
//! # ICA Certified State
//!
//! Reconstructs hash trees from replica responses, recomputes their root
//! hashes, and verifies the BLS signature that certifies them, directly
//! under the root key or through a bounded chain of subnet delegations.

/// Signed certificates and their verifier.
pub mod certificate;
/// The hash tree and path lookup.
pub mod tree;

pub use certificate::{Certificate, CertificateVerifier, Delegation, Verified};
pub use tree::{Digest, HashTree, LookupResult};
