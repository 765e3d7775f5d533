// Path: crates/crypto/src/lib.rs
//! # ICA Crypto Crate Lints
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
//! # ICA Cryptography
//!
//! SHA-2 helpers, BLS12-381 certificate signature verification and the
//! Ed25519 request-signing identity.

pub mod algorithms;
pub mod error;
pub mod sign;
