// Path: crates/types/src/app/principal.rs
//! The `Principal` identifier for callers and canisters.

use crate::error::PrincipalError;
use crate::MAX_PRINCIPAL_BYTES;
use data_encoding::BASE32_NOPAD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

const ANONYMOUS_TAG: u8 = 0x04;
/// Suffix byte of principals derived from a public key.
pub const SELF_AUTHENTICATING_TAG: u8 = 0x02;

/// An opaque identifier of at most 29 bytes naming a caller or a canister.
///
/// Ordering is the lexicographic order of the raw bytes, which is the order
/// used by canister-id ranges in delegations.
#[derive(Clone, Copy)]
pub struct Principal {
    len: u8,
    bytes: [u8; MAX_PRINCIPAL_BYTES],
}

impl Principal {
    /// The management canister, whose id is the empty byte string.
    pub const fn management_canister() -> Self {
        Self {
            len: 0,
            bytes: [0u8; MAX_PRINCIPAL_BYTES],
        }
    }

    /// The anonymous principal (`2vxsx-fae`).
    pub const fn anonymous() -> Self {
        let mut bytes = [0u8; MAX_PRINCIPAL_BYTES];
        bytes[0] = ANONYMOUS_TAG;
        Self { len: 1, bytes }
    }

    /// Builds a full-length principal, such as a self-authenticating id.
    pub const fn from_array(bytes: [u8; MAX_PRINCIPAL_BYTES]) -> Self {
        Self {
            len: MAX_PRINCIPAL_BYTES as u8,
            bytes,
        }
    }

    /// Builds a principal from raw bytes.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, PrincipalError> {
        if slice.len() > MAX_PRINCIPAL_BYTES {
            return Err(PrincipalError::TooLong(slice.len()));
        }
        let mut bytes = [0u8; MAX_PRINCIPAL_BYTES];
        bytes
            .get_mut(..slice.len())
            .ok_or(PrincipalError::TooLong(slice.len()))?
            .copy_from_slice(slice);
        Ok(Self {
            len: slice.len() as u8,
            bytes,
        })
    }

    /// The raw bytes of the principal.
    pub fn as_slice(&self) -> &[u8] {
        self.bytes.get(..self.len as usize).unwrap_or(&[])
    }

    /// Whether this is the anonymous principal.
    pub fn is_anonymous(&self) -> bool {
        self.as_slice() == [ANONYMOUS_TAG]
    }

    /// Renders the textual form: base32 of `crc32 || bytes`, lowercase,
    /// grouped in fives with dashes.
    pub fn to_text(&self) -> String {
        let checksum = crc32fast::hash(self.as_slice());
        let mut buf = Vec::with_capacity(4 + self.as_slice().len());
        buf.extend_from_slice(&checksum.to_be_bytes());
        buf.extend_from_slice(self.as_slice());
        let encoded = BASE32_NOPAD.encode(&buf).to_ascii_lowercase();

        let mut out = String::with_capacity(encoded.len() + encoded.len() / 5);
        for (i, c) in encoded.chars().enumerate() {
            if i > 0 && i % 5 == 0 {
                out.push('-');
            }
            out.push(c);
        }
        out
    }

    /// Parses the textual form, validating the checksum and the grouping.
    pub fn from_text(text: &str) -> Result<Self, PrincipalError> {
        let compact: String = text
            .chars()
            .filter(|c| *c != '-')
            .map(|c| c.to_ascii_uppercase())
            .collect();
        let decoded = BASE32_NOPAD
            .decode(compact.as_bytes())
            .map_err(|e| PrincipalError::InvalidText(e.to_string()))?;
        if decoded.len() < 4 {
            return Err(PrincipalError::InvalidText(format!(
                "'{}' is too short to carry a checksum",
                text
            )));
        }
        let (checksum, body) = decoded.split_at(4);
        if crc32fast::hash(body).to_be_bytes() != checksum {
            return Err(PrincipalError::ChecksumMismatch);
        }
        let principal = Self::try_from_slice(body)?;
        let canonical = principal.to_text();
        if canonical != text {
            return Err(PrincipalError::NonCanonical(canonical));
        }
        Ok(principal)
    }
}

impl PartialEq for Principal {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for Principal {}

impl std::hash::Hash for Principal {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl PartialOrd for Principal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Principal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}

impl AsRef<[u8]> for Principal {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl TryFrom<&[u8]> for Principal {
    type Error = PrincipalError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::try_from_slice(value)
    }
}

impl FromStr for Principal {
    type Err = PrincipalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_text(s)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Principal({})", self.to_text())
    }
}

impl Serialize for Principal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_text())
    }
}

impl<'de> Deserialize<'de> for Principal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_text(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_text_forms() {
        assert_eq!(Principal::anonymous().to_text(), "2vxsx-fae");
        assert_eq!(Principal::management_canister().to_text(), "aaaaa-aa");

        let ledger = Principal::try_from_slice(&[0, 0, 0, 0, 0, 0, 0, 2, 1, 1]).unwrap();
        assert_eq!(ledger.to_text(), "ryjl3-tyaaa-aaaaa-aaaba-cai");
    }

    #[test]
    fn test_text_roundtrip_and_validation() {
        let p = Principal::from_text("ryjl3-tyaaa-aaaaa-aaaba-cai").unwrap();
        assert_eq!(p.as_slice(), &[0, 0, 0, 0, 0, 0, 0, 2, 1, 1]);

        // Flipping a character breaks the checksum.
        assert!(Principal::from_text("ryjl3-tyaaa-aaaaa-aaaba-caa").is_err());
        // Missing dashes decode but are not canonical.
        assert!(matches!(
            Principal::from_text("ryjl3tyaaaaaaaaaaabacai"),
            Err(PrincipalError::NonCanonical(_))
        ));
    }

    #[test]
    fn test_length_limit_and_ordering() {
        assert!(Principal::try_from_slice(&[0u8; 29]).is_ok());
        assert_eq!(
            Principal::try_from_slice(&[0u8; 30]),
            Err(PrincipalError::TooLong(30))
        );

        let low = Principal::try_from_slice(&[0, 1]).unwrap();
        let high = Principal::try_from_slice(&[0, 2]).unwrap();
        let longer = Principal::try_from_slice(&[0, 1, 0]).unwrap();
        assert!(low < high);
        assert!(low < longer && longer < high);
    }

    #[test]
    fn test_serde_uses_text_form() {
        let json = serde_json::to_string(&Principal::anonymous()).unwrap();
        assert_eq!(json, "\"2vxsx-fae\"");
        let back: Principal = serde_json::from_str(&json).unwrap();
        assert!(back.is_anonymous());
    }
}
