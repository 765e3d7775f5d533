// Path: crates/api/src/error/mod.rs
// Re-export all core error types from the central types crate.
pub use ica_types::error::{
    AgentError, CandidError, CertificateError, ConfigError, CryptoError, ErrorCode,
    PrincipalError, TransportError,
};
pub use ica_types::Result;
