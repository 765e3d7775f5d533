// Path: crates/client/src/lib.rs
//! # ICA Client Crate Lints
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
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! # ICA Client
//!
//! The call/poll protocol: canonical request ids, signed envelopes, the call
//! state machine and the `Agent` that drives it over an injected transport
//! and scheduler.

pub mod agent;
pub mod backoff;
pub mod envelope;
pub mod options;
pub mod request_id;
pub mod status;

pub use agent::Agent;
pub use backoff::Backoff;
pub use envelope::{sign_request, Envelope, SignedRequest};
pub use options::CallOptions;
pub use request_id::request_id;
pub use status::{lookup_request_status, CallState};
