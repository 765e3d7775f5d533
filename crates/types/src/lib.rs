// Path: crates/types/src/lib.rs
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]

//! # ICA Types
//!
//! This crate is the foundational library for the ICA agent, containing the
//! core data structures, error types, and configuration objects shared by the
//! codec, certificate, and client crates.
//!
//! ## Architectural Role
//!
//! As the base crate, `ica-types` has minimal dependencies and is itself a
//! dependency for every other crate in the workspace. This structure prevents
//! circular dependencies and provides a stable, canonical definition for shared
//! types like `Principal`, `RequestId`, `RejectCode`, and the error enums.

/// The maximum length in bytes of a principal identifier.
pub const MAX_PRINCIPAL_BYTES: usize = 29;
/// The length in bytes of every hash used by the protocol (SHA-256).
pub const HASH_LEN: usize = 32;

/// A top-level, crate-wide `Result` type alias with a default error type.
pub type Result<T, E = crate::error::AgentError> = std::result::Result<T, E>;

/// Protocol-level data structures: principals, request ids and request contents.
pub mod app;
/// CBOR helpers shared by the certificate and envelope code.
pub mod codec;
/// Agent configuration (`AgentConfig`) and its TOML loading.
pub mod config;
/// A unified set of all error types used across the workspace.
pub mod error;
/// The most commonly used identifiers and the `ErrorCode` trait.
pub mod prelude;
