// Path: crates/crypto/src/algorithms/mod.rs

/// SHA-2 digests.
pub mod hash;
