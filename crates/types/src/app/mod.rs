// Path: crates/types/src/app/mod.rs
//! Protocol-level data structures shared by the codec, certificate and client crates.

/// The `Principal` identifier and its textual encoding.
pub mod principal;
/// The contents of call, query and read-state requests.
pub mod request;

pub use principal::{Principal, SELF_AUTHENTICATING_TAG};
pub use request::{CallRequest, QueryRequest, ReadStateRequest, RequestContent};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The canonical content hash of a request, used to correlate submission and polling.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub [u8; 32]);

impl RequestId {
    /// The raw 32 bytes of the id.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl AsRef<[u8]> for RequestId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestId({})", hex::encode(self.0))
    }
}

impl FromStr for RequestId {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut out = [0u8; 32];
        hex::decode_to_slice(s, &mut out)?;
        Ok(Self(out))
    }
}

/// The reject code taxonomy of the replica.
///
/// Only `SysTransient` is eligible for resubmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectCode {
    /// Fatal system error, retry unlikely to be useful.
    SysFatal,
    /// Transient system error, retry might be possible.
    SysTransient,
    /// Invalid destination (e.g. canister/account does not exist).
    DestinationInvalid,
    /// Explicit reject by the canister.
    CanisterReject,
    /// Canister error (e.g., trap, no response).
    CanisterError,
    /// Response unknown; the system stopped waiting for it.
    SysUnknown,
    /// A code this client does not know.
    Unrecognized(u64),
}

impl RejectCode {
    /// The numeric wire value of the code.
    pub fn as_u64(&self) -> u64 {
        match self {
            Self::SysFatal => 1,
            Self::SysTransient => 2,
            Self::DestinationInvalid => 3,
            Self::CanisterReject => 4,
            Self::CanisterError => 5,
            Self::SysUnknown => 6,
            Self::Unrecognized(code) => *code,
        }
    }

    /// Whether a fresh submission of the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::SysTransient)
    }
}

impl From<u64> for RejectCode {
    fn from(code: u64) -> Self {
        match code {
            1 => Self::SysFatal,
            2 => Self::SysTransient,
            3 => Self::DestinationInvalid,
            4 => Self::CanisterReject,
            5 => Self::CanisterError,
            6 => Self::SysUnknown,
            other => Self::Unrecognized(other),
        }
    }
}

impl fmt::Display for RejectCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unrecognized(code) => write!(f, "Unrecognized({})", code),
            other => write!(f, "{:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_code_mapping() {
        for code in 1..=6u64 {
            assert_eq!(RejectCode::from(code).as_u64(), code);
        }
        assert_eq!(RejectCode::from(42), RejectCode::Unrecognized(42));
        assert!(RejectCode::SysTransient.is_retryable());
        assert!(!RejectCode::CanisterReject.is_retryable());
        assert!(!RejectCode::SysUnknown.is_retryable());
    }

    #[test]
    fn test_request_id_hex_roundtrip() {
        let id = RequestId([0xab; 32]);
        let text = id.to_string();
        assert_eq!(text.len(), 64);
        assert_eq!(text.parse::<RequestId>().unwrap(), id);
    }
}
