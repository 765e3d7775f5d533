// Path: crates/types/src/error/mod.rs
//! Core error types for the ICA agent.

use crate::app::{RejectCode, RequestId};
use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Errors raised by the Candid value and type codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CandidError {
    /// The byte stream is malformed: a truncated varint, a buffer underrun,
    /// a bad magic header or invalid UTF-8.
    #[error("Encoding error: {0}")]
    Encoding(String),
    /// A decoded or supplied number does not fit its declared width.
    #[error("Value out of range: {0}")]
    Range(String),
    /// The value's shape disagrees with the type, or the wire type is not a
    /// subtype of the expected type.
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),
    /// The wire type table declares more entries than the decoder accepts.
    #[error("Type table has {entries} entries, limit is {limit}")]
    TableTooLarge {
        /// The number of entries announced on the wire.
        entries: u64,
        /// The configured maximum.
        limit: usize,
    },
    /// Type or value nesting exceeded the configured depth.
    #[error("Nesting depth exceeds limit of {0}")]
    DepthExceeded(usize),
    /// The decoder consumed more elements than its quota allows.
    #[error("Decoding quota exceeded: {0}")]
    QuotaExceeded(String),
    /// A custom, unspecified codec error.
    #[error("Candid error: {0}")]
    Custom(String),
}

impl ErrorCode for CandidError {
    fn code(&self) -> &'static str {
        match self {
            Self::Encoding(_) => "CANDID_ENCODING_ERROR",
            Self::Range(_) => "CANDID_RANGE_ERROR",
            Self::TypeMismatch(_) => "CANDID_TYPE_MISMATCH",
            Self::TableTooLarge { .. } => "CANDID_TABLE_TOO_LARGE",
            Self::DepthExceeded(_) => "CANDID_DEPTH_EXCEEDED",
            Self::QuotaExceeded(_) => "CANDID_QUOTA_EXCEEDED",
            Self::Custom(_) => "CANDID_CUSTOM_ERROR",
        }
    }
}

/// Reasons a certificate is rejected by the verifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CertificateError {
    /// The certificate, its tree or its delegation violates a structural invariant.
    #[error("Malformed certificate: {0}")]
    Malformed(String),
    /// The BLS signature does not verify over the tree's root hash.
    #[error("Certificate signature verification failed: {0}")]
    Signature(String),
    /// The certified time lies outside the allowed clock-skew window.
    #[error("Certificate time {certificate_time_ns}ns is outside the allowed skew of {skew_ns}ns around {now_ns}ns")]
    Expired {
        /// The `time` leaf of the certificate, in nanoseconds since the epoch.
        certificate_time_ns: u64,
        /// The local time the certificate was checked against.
        now_ns: u64,
        /// The configured allowed skew.
        skew_ns: u64,
    },
    /// The delegation does not cover the canister the certificate was requested for.
    #[error("Canister {canister_id} is not in the range delegated to subnet {subnet_id}")]
    CanisterRangeViolation {
        /// Textual form of the canister id.
        canister_id: String,
        /// Textual form of the subnet id named by the delegation.
        subnet_id: String,
    },
    /// The delegation chain is longer than the configured bound.
    #[error("Delegation chain depth {depth} exceeds the maximum of {max}")]
    DelegationDepthExceeded {
        /// The observed depth.
        depth: usize,
        /// The configured maximum.
        max: usize,
    },
    /// A delegation points back to a subnet already visited in the chain.
    #[error("Delegation chain revisits subnet {0}")]
    DelegationCycle(String),
    /// A path the verifier requires is absent from the tree.
    #[error("Required path {0} is missing from the certificate")]
    MissingPath(String),
}

impl ErrorCode for CertificateError {
    fn code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "CERT_MALFORMED",
            Self::Signature(_) => "CERT_SIGNATURE_INVALID",
            Self::Expired { .. } => "CERT_EXPIRED",
            Self::CanisterRangeViolation { .. } => "CERT_CANISTER_RANGE_VIOLATION",
            Self::DelegationDepthExceeded { .. } => "CERT_DELEGATION_DEPTH_EXCEEDED",
            Self::DelegationCycle(_) => "CERT_DELEGATION_CYCLE",
            Self::MissingPath(_) => "CERT_MISSING_PATH",
        }
    }
}

/// Errors from cryptographic operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// The signature failed cryptographic verification.
    #[error("Signature verification failed")]
    VerificationFailed,
    /// The provided key material is malformed or invalid for the specified algorithm.
    #[error("Invalid cryptographic key: {0}")]
    InvalidKey(String),
    /// The provided signature material is malformed or invalid for the specified algorithm.
    #[error("Invalid signature format: {0}")]
    InvalidSignature(String),
    /// A key, signature or hash had an unexpected length.
    #[error("Invalid length: expected {expected}, got {got}")]
    InvalidLength {
        /// The expected length in bytes.
        expected: usize,
        /// The actual length in bytes.
        got: usize,
    },
    /// An error occurred during deserialization of a cryptographic object.
    #[error("Deserialization error: {0}")]
    Deserialization(String),
    /// A generic failure in an underlying cryptographic library or signer.
    #[error("Cryptographic operation failed: {0}")]
    OperationFailed(String),
}

impl ErrorCode for CryptoError {
    fn code(&self) -> &'static str {
        match self {
            Self::VerificationFailed => "CRYPTO_VERIFICATION_FAILED",
            Self::InvalidKey(_) => "CRYPTO_INVALID_KEY",
            Self::InvalidSignature(_) => "CRYPTO_INVALID_SIGNATURE",
            Self::InvalidLength { .. } => "CRYPTO_INVALID_LENGTH",
            Self::Deserialization(_) => "CRYPTO_DESERIALIZATION_ERROR",
            Self::OperationFailed(_) => "CRYPTO_OPERATION_FAILED",
        }
    }
}

/// Failures reported by the transport collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The replica could not be reached.
    #[error("Replica unreachable: {0}")]
    Unreachable(String),
    /// The replica answered with a non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Http {
        /// The HTTP status code.
        status: u16,
        /// A (possibly truncated) response body.
        body: String,
    },
    /// The request did not complete in time.
    #[error("Transport timeout: {0}")]
    Timeout(String),
    /// Any other transport failure.
    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    /// Returns true for failures a retry may cure: unreachable peers,
    /// timeouts, HTTP 429 and 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Unreachable(_) | Self::Timeout(_) => true,
            Self::Http { status, .. } => *status == 429 || (500..600).contains(status),
            Self::Other(_) => false,
        }
    }
}

impl ErrorCode for TransportError {
    fn code(&self) -> &'static str {
        match self {
            Self::Unreachable(_) => "TRANSPORT_UNREACHABLE",
            Self::Http { .. } => "TRANSPORT_HTTP_ERROR",
            Self::Timeout(_) => "TRANSPORT_TIMEOUT",
            Self::Other(_) => "TRANSPORT_OTHER",
        }
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
    /// A configuration value is out of its valid range.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ErrorCode for ConfigError {
    fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "CONFIG_IO_ERROR",
            Self::Parse(_) => "CONFIG_PARSE_ERROR",
            Self::Invalid(_) => "CONFIG_INVALID",
        }
    }
}

/// Errors raised while parsing principals.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrincipalError {
    /// The principal is longer than the protocol allows.
    #[error("Principal is {0} bytes long, maximum is 29")]
    TooLong(usize),
    /// The textual form is not valid base32 or is too short.
    #[error("Invalid principal text: {0}")]
    InvalidText(String),
    /// The CRC32 checksum of the textual form does not match.
    #[error("Principal checksum mismatch")]
    ChecksumMismatch,
    /// The text decodes but is not in its canonical grouping.
    #[error("Principal text is not canonical, expected {0}")]
    NonCanonical(String),
}

impl ErrorCode for PrincipalError {
    fn code(&self) -> &'static str {
        match self {
            Self::TooLong(_) => "PRINCIPAL_TOO_LONG",
            Self::InvalidText(_) => "PRINCIPAL_INVALID_TEXT",
            Self::ChecksumMismatch => "PRINCIPAL_CHECKSUM_MISMATCH",
            Self::NonCanonical(_) => "PRINCIPAL_NON_CANONICAL",
        }
    }
}

/// Terminal failures of a call lifecycle, as seen by the caller.
#[derive(Error, Debug)]
pub enum AgentError {
    /// The transport collaborator failed.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
    /// A certificate returned by the replica did not verify.
    #[error("Certificate error: {0}")]
    Certificate(#[from] CertificateError),
    /// Encoding an argument or decoding a reply failed.
    #[error("Candid error: {0}")]
    Candid(#[from] CandidError),
    /// Signing or key handling failed.
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
    /// The replica rejected the call.
    #[error("Call {request_id} rejected with {reject_code}: {reject_message}")]
    CallRejected {
        /// The id of the rejected request.
        request_id: RequestId,
        /// The protocol reject code.
        reject_code: RejectCode,
        /// The human-readable reject message.
        reject_message: String,
        /// The optional replica error code (e.g. `IC0503`).
        error_code: Option<String>,
    },
    /// The call did not reach a terminal state before the deadline.
    #[error("Polling for request {request_id} timed out after {elapsed_ms}ms")]
    PollTimeout {
        /// The id of the request that was being polled.
        request_id: RequestId,
        /// Wall-clock time spent polling.
        elapsed_ms: u64,
    },
    /// The request completed but its reply is no longer retained.
    #[error("Request {0} is done and its reply is no longer available")]
    ReplyUnavailable(RequestId),
    /// The replica's response violates the protocol.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    /// A principal could not be parsed.
    #[error("Principal error: {0}")]
    Principal(#[from] PrincipalError),
    /// The agent configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl AgentError {
    /// Returns true when the error is a legitimate rejection by the network
    /// rather than a protocol or local failure.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::CallRejected { .. })
    }
}

impl ErrorCode for AgentError {
    fn code(&self) -> &'static str {
        match self {
            Self::Transport(e) => e.code(),
            Self::Certificate(e) => e.code(),
            Self::Candid(e) => e.code(),
            Self::Crypto(e) => e.code(),
            Self::CallRejected { .. } => "AGENT_CALL_REJECTED",
            Self::PollTimeout { .. } => "AGENT_POLL_TIMEOUT",
            Self::ReplyUnavailable(_) => "AGENT_REPLY_UNAVAILABLE",
            Self::InvalidResponse(_) => "AGENT_INVALID_RESPONSE",
            Self::Principal(e) => e.code(),
            Self::Config(e) => e.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_transient_classification() {
        assert!(TransportError::Timeout("slow".into()).is_transient());
        assert!(TransportError::Unreachable("refused".into()).is_transient());
        assert!(TransportError::Http {
            status: 503,
            body: String::new()
        }
        .is_transient());
        assert!(TransportError::Http {
            status: 429,
            body: String::new()
        }
        .is_transient());
        assert!(!TransportError::Http {
            status: 400,
            body: "bad envelope".into()
        }
        .is_transient());
        assert!(!TransportError::Other("tls".into()).is_transient());
    }

    #[test]
    fn test_agent_error_codes_delegate_to_source() {
        let err = AgentError::from(CertificateError::Signature("bad".into()));
        assert_eq!(err.code(), "CERT_SIGNATURE_INVALID");
        assert!(!err.is_rejection());

        let err = AgentError::CallRejected {
            request_id: RequestId([0u8; 32]),
            reject_code: RejectCode::CanisterReject,
            reject_message: "nope".into(),
            error_code: None,
        };
        assert_eq!(err.code(), "AGENT_CALL_REJECTED");
        assert!(err.is_rejection());
    }
}
