// Path: crates/types/src/app/request.rs
//! The contents of the requests a client sends to a replica.
//!
//! These are plain data; the request id, signing and CBOR framing live in the
//! client crate.

use super::Principal;

/// A state-changing call to a canister method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    /// The canister the call is addressed to.
    pub canister_id: Principal,
    /// The method to invoke.
    pub method_name: String,
    /// The Candid-encoded argument bytes.
    pub arg: Vec<u8>,
    /// The caller.
    pub sender: Principal,
    /// Expiry in nanoseconds since the epoch.
    pub ingress_expiry: u64,
    /// Optional nonce distinguishing otherwise identical calls.
    pub nonce: Option<Vec<u8>>,
}

/// A read-only query call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    /// The canister the query is addressed to.
    pub canister_id: Principal,
    /// The method to invoke.
    pub method_name: String,
    /// The Candid-encoded argument bytes.
    pub arg: Vec<u8>,
    /// The caller.
    pub sender: Principal,
    /// Expiry in nanoseconds since the epoch.
    pub ingress_expiry: u64,
}

/// A request for a certified subset of the replica state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadStateRequest {
    /// Each path is a list of labels.
    pub paths: Vec<Vec<Vec<u8>>>,
    /// The caller.
    pub sender: Principal,
    /// Expiry in nanoseconds since the epoch.
    pub ingress_expiry: u64,
}

/// Any request content that can be hashed, signed and enveloped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestContent {
    /// A `call` request.
    Call(CallRequest),
    /// A `query` request.
    Query(QueryRequest),
    /// A `read_state` request.
    ReadState(ReadStateRequest),
}

impl RequestContent {
    /// The `request_type` field value.
    pub fn request_type(&self) -> &'static str {
        match self {
            Self::Call(_) => "call",
            Self::Query(_) => "query",
            Self::ReadState(_) => "read_state",
        }
    }

    /// The sender of the request.
    pub fn sender(&self) -> &Principal {
        match self {
            Self::Call(c) => &c.sender,
            Self::Query(q) => &q.sender,
            Self::ReadState(r) => &r.sender,
        }
    }

    /// The ingress expiry of the request.
    pub fn ingress_expiry(&self) -> u64 {
        match self {
            Self::Call(c) => c.ingress_expiry,
            Self::Query(q) => q.ingress_expiry,
            Self::ReadState(r) => r.ingress_expiry,
        }
    }
}

impl From<CallRequest> for RequestContent {
    fn from(value: CallRequest) -> Self {
        Self::Call(value)
    }
}

impl From<QueryRequest> for RequestContent {
    fn from(value: QueryRequest) -> Self {
        Self::Query(value)
    }
}

impl From<ReadStateRequest> for RequestContent {
    fn from(value: ReadStateRequest) -> Self {
        Self::ReadState(value)
    }
}
