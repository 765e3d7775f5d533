// Path: crates/telemetry/src/lib.rs
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

//! # ICA Telemetry
//!
//! Structured logging for binaries built on the ICA agent. Libraries only
//! emit `tracing` events; installing a subscriber is left to the process.

/// The initialization routine for global structured logging.
pub mod init;

pub use init::{init_tracing, init_tracing_with, LogFormat, TelemetryError};
