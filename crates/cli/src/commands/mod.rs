// Path: crates/cli/src/commands/mod.rs

pub mod certificate;
pub mod decode;
pub mod principal;
pub mod request_id;
