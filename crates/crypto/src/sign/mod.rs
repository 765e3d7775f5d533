// Path: crates/crypto/src/sign/mod.rs

pub mod bls;
pub mod eddsa;
