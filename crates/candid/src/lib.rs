// Path: crates/candid/src/lib.rs
//! # ICA Candid Crate Lints
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
//! # ICA Candid
//!
//! The interchange codec: LEB128 primitives, the type descriptor algebra,
//! canonical type tables, and a value codec that applies the wire
//! subtyping rules on decode. Every function here is pure over its inputs.

pub mod config;
pub mod decoder;
pub mod encoder;
pub mod leb128;
mod reader;
pub mod table;
pub mod types;
pub mod value;

pub use config::DecoderConfig;
pub use decoder::{decode_args, decode_one};
pub use encoder::{encode_args, encode_one};
pub use types::{idl_hash, Field, FuncMode, Function, IntWidth, Label, Type, TypeEnv};
pub use value::{FieldValue, IdlArgs, Value};

/// Every Candid message starts with these four bytes.
pub const MAGIC: &[u8; 4] = b"DIDL";

/// Result alias for codec operations.
pub type Result<T> = std::result::Result<T, ica_types::error::CandidError>;
