// Path: crates/crypto/src/error.rs
//! Local error types for the `ica-crypto` crate.

// Re-export the canonical error type from the API crate.
pub use ica_api::error::CryptoError;
