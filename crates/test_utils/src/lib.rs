// Path: crates/test_utils/src/lib.rs
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

//! # ICA Test Utilities
//!
//! An in-process replica that signs real certificates, a scheduler running
//! on virtual time, and deterministic fixtures.

pub mod fixtures;
pub mod randomness;
pub mod replica;
pub mod scheduler;

pub use replica::{MockReplica, QueryAnswer};
pub use scheduler::ManualScheduler;
