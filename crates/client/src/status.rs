// Path: crates/client/src/status.rs
//! The call lifecycle and its reconstruction from certified state.

use ica_candid::leb128::decode_unsigned;
use ica_state::{Certificate, LookupResult};
use ica_types::app::{RejectCode, RequestId};
use ica_types::error::AgentError;
use std::fmt;

/// Where a call stands.
///
/// `Submitted -> Processing -> {Replied | Rejected | Done}`, with `Unknown`
/// reachable whenever the replica's answer is ambiguous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallState {
    /// The transport accepted the envelope.
    Submitted,
    /// The replica received the call or is executing it.
    Processing,
    /// The call completed with these reply bytes.
    Replied(Vec<u8>),
    /// The call was rejected.
    Rejected {
        code: RejectCode,
        message: String,
        error_code: Option<String>,
    },
    /// The call completed and its reply is no longer retained.
    Done,
    /// The replica state says nothing about the call.
    Unknown,
}

impl CallState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CallState::Replied(_) | CallState::Rejected { .. } | CallState::Done
        )
    }

    /// The state after observing `observed`. Terminal states absorb every
    /// observation; `Submitted` is never observed from the replica.
    pub fn advance(self, observed: CallState) -> CallState {
        if self.is_terminal() {
            return self;
        }
        match observed {
            CallState::Submitted => self,
            other => other,
        }
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallState::Submitted => f.write_str("submitted"),
            CallState::Processing => f.write_str("processing"),
            CallState::Replied(reply) => write!(f, "replied ({} bytes)", reply.len()),
            CallState::Rejected { code, message, .. } => write!(f, "rejected ({code}: {message})"),
            CallState::Done => f.write_str("done"),
            CallState::Unknown => f.write_str("unknown"),
        }
    }
}

/// Path of a leaf under `/request_status/<request_id>`.
pub fn status_path<'a>(request_id: &'a RequestId, leaf: &'a str) -> [&'a [u8]; 3] {
    [b"request_status", request_id.as_ref(), leaf.as_bytes()]
}

/// Reads the status of `request_id` out of a verified certificate.
pub fn lookup_request_status(
    certificate: &Certificate,
    request_id: &RequestId,
) -> Result<CallState, AgentError> {
    let status = match certificate.lookup(&status_path(request_id, "status")) {
        LookupResult::Found(status) => status,
        LookupResult::Absent | LookupResult::Unknown => return Ok(CallState::Unknown),
        LookupResult::Error => return Err(invalid("request status is not a leaf")),
    };
    match status {
        b"received" | b"processing" => Ok(CallState::Processing),
        b"replied" => match certificate.lookup(&status_path(request_id, "reply")) {
            LookupResult::Found(reply) => Ok(CallState::Replied(reply.to_vec())),
            _ => Err(invalid("replied request has no reply")),
        },
        b"rejected" => rejection(certificate, request_id),
        b"done" => Ok(CallState::Done),
        other => Err(invalid(&format!(
            "unrecognised request status {}",
            String::from_utf8_lossy(other)
        ))),
    }
}

fn rejection(certificate: &Certificate, request_id: &RequestId) -> Result<CallState, AgentError> {
    let code = match certificate.lookup(&status_path(request_id, "reject_code")) {
        LookupResult::Found(bytes) => {
            let (code, _) = decode_unsigned(bytes, 0)?;
            RejectCode::from(code)
        }
        _ => return Err(invalid("rejected request has no reject_code")),
    };
    let message = match certificate.lookup(&status_path(request_id, "reject_message")) {
        LookupResult::Found(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        _ => return Err(invalid("rejected request has no reject_message")),
    };
    let error_code = match certificate.lookup(&status_path(request_id, "error_code")) {
        LookupResult::Found(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    };
    Ok(CallState::Rejected {
        code,
        message,
        error_code,
    })
}

fn invalid(msg: &str) -> AgentError {
    AgentError::InvalidResponse(msg.to_string())
}
