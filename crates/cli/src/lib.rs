// Path: crates/cli/src/lib.rs
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

//! # ICA CLI Library
//!
//! The commands behind the `ica` binary. Each command composes the public
//! APIs of the agent crates and returns its report as text, so the binary
//! only parses arguments and prints.
//!
//! The CLI holds no protocol logic of its own: decoding, verification and
//! hashing all happen in `ica-candid`, `ica-state` and `ica-client`.

pub mod commands;
pub mod util;
