// Path: crates/crypto/src/algorithms/hash/mod.rs
//! SHA-2 digests used by request ids, hash trees and principals.

use sha2::{Digest, Sha224, Sha256};

/// SHA-256 of a single buffer.
pub fn sha256(message: &[u8]) -> [u8; 32] {
    Sha256::digest(message).into()
}

/// SHA-224 of a single buffer.
pub fn sha224(message: &[u8]) -> [u8; 28] {
    Sha224::digest(message).into()
}

/// SHA-256 over the concatenation of `parts`, without materialising it.
pub fn sha256_parts<'a, I>(parts: I) -> [u8; 32]
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// SHA-256 of a domain-separated message: `len(sep) || sep || parts...`.
///
/// The separator is at most 255 bytes; every separator used by the protocol
/// is a short ASCII constant.
pub fn sha256_domain<'a, I>(separator: &[u8], parts: I) -> [u8; 32]
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut hasher = Sha256::new();
    hasher.update([separator.len() as u8]);
    hasher.update(separator);
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}
