// Path: crates/client/src/envelope.rs
//! Signed CBOR envelopes around request contents.

use crate::request_id::request_id;
use ciborium::value::Value;
use ica_api::crypto::{DerPublicKey, SerializableKey, VerifyingKey};
use ica_api::identity::Identity;
use ica_crypto::sign::eddsa::{self_authenticating_principal, Ed25519PublicKey, Ed25519Signature};
use ica_types::app::{
    CallRequest, Principal, QueryRequest, ReadStateRequest, RequestContent, RequestId,
};
use ica_types::codec::{as_u64, from_cbor_bytes, map_get, text_map, to_cbor_bytes};
use ica_types::error::{AgentError, CryptoError};

/// Separator of the message a sender signature covers.
pub const REQUEST_DOMAIN: &[u8] = b"ic-request";

/// An envelope ready for the transport, with the id it will be polled under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub request_id: RequestId,
    pub envelope: Vec<u8>,
}

/// `"\x0Aic-request" || request_id`
pub fn signing_message(request_id: &RequestId) -> Vec<u8> {
    let mut message = Vec::with_capacity(1 + REQUEST_DOMAIN.len() + 32);
    message.push(REQUEST_DOMAIN.len() as u8);
    message.extend_from_slice(REQUEST_DOMAIN);
    message.extend_from_slice(request_id.as_bytes());
    message
}

fn content_to_cbor(content: &RequestContent) -> Value {
    let bytes = |b: &[u8]| Value::Bytes(b.to_vec());
    let mut entries = vec![(
        "request_type",
        Value::Text(content.request_type().to_string()),
    )];
    match content {
        RequestContent::Call(call) => {
            entries.push(("canister_id", bytes(call.canister_id.as_slice())));
            entries.push(("method_name", Value::Text(call.method_name.clone())));
            entries.push(("arg", bytes(&call.arg)));
            if let Some(nonce) = &call.nonce {
                entries.push(("nonce", bytes(nonce)));
            }
        }
        RequestContent::Query(query) => {
            entries.push(("canister_id", bytes(query.canister_id.as_slice())));
            entries.push(("method_name", Value::Text(query.method_name.clone())));
            entries.push(("arg", bytes(&query.arg)));
        }
        RequestContent::ReadState(read) => {
            let paths = read
                .paths
                .iter()
                .map(|path| Value::Array(path.iter().map(|l| bytes(l)).collect()))
                .collect();
            entries.push(("paths", Value::Array(paths)));
        }
    }
    entries.push(("sender", bytes(content.sender().as_slice())));
    entries.push((
        "ingress_expiry",
        Value::Integer(content.ingress_expiry().into()),
    ));
    text_map(entries)
}

/// Hashes, signs and frames `content`.
///
/// Identities without a key (the anonymous one) produce an envelope with
/// neither `sender_pubkey` nor `sender_sig`.
pub fn sign_request(
    content: &RequestContent,
    identity: &dyn Identity,
) -> Result<SignedRequest, AgentError> {
    let request_id = request_id(content);
    let mut entries = vec![("content", content_to_cbor(content))];
    if let Some(public_key) = identity.public_key() {
        if let Some(signature) = identity.sign(&signing_message(&request_id))? {
            entries.push(("sender_pubkey", Value::Bytes(public_key)));
            entries.push(("sender_sig", Value::Bytes(signature)));
        }
    }
    let envelope = to_cbor_bytes(&text_map(entries))
        .map_err(|e| CryptoError::OperationFailed(format!("envelope encoding: {e}")))?;
    Ok(SignedRequest {
        request_id,
        envelope,
    })
}

/// A parsed envelope, as a replica sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub content: RequestContent,
    pub sender_pubkey: Option<Vec<u8>>,
    pub sender_sig: Option<Vec<u8>>,
}

impl Envelope {
    pub fn from_cbor_bytes(bytes: &[u8]) -> Result<Self, AgentError> {
        let value = from_cbor_bytes(bytes).map_err(AgentError::InvalidResponse)?;
        let content = map_get(&value, "content")
            .ok_or_else(|| invalid("envelope has no content"))
            .and_then(parse_content)?;
        let optional_bytes = |key: &str| map_get(&value, key).and_then(Value::as_bytes).cloned();
        Ok(Self {
            content,
            sender_pubkey: optional_bytes("sender_pubkey"),
            sender_sig: optional_bytes("sender_sig"),
        })
    }

    pub fn request_id(&self) -> RequestId {
        request_id(&self.content)
    }

    /// Checks that the sender signed this content with the key its
    /// principal is derived from. Anonymous envelopes carry no signature.
    pub fn verify_sender(&self) -> Result<(), CryptoError> {
        let sender = self.content.sender();
        match (&self.sender_pubkey, &self.sender_sig) {
            (None, None) if sender.is_anonymous() => Ok(()),
            (Some(der), Some(sig)) => {
                if self_authenticating_principal(der) != *sender {
                    return Err(CryptoError::InvalidKey(format!(
                        "public key does not belong to sender {sender}"
                    )));
                }
                let key = Ed25519PublicKey::from_der(der)?;
                let signature = Ed25519Signature::from_bytes(sig)?;
                key.verify(&signing_message(&self.request_id()), &signature)
            }
            _ => Err(CryptoError::InvalidSignature(format!(
                "envelope from {sender} is not signed"
            ))),
        }
    }
}

fn parse_content(value: &Value) -> Result<RequestContent, AgentError> {
    let text = |key: &str| {
        map_get(value, key)
            .and_then(Value::as_text)
            .map(str::to_string)
            .ok_or_else(|| invalid(&format!("content field {key} missing or not text")))
    };
    let blob = |key: &str| {
        map_get(value, key)
            .and_then(Value::as_bytes)
            .cloned()
            .ok_or_else(|| invalid(&format!("content field {key} missing or not bytes")))
    };
    let principal = |key: &str| -> Result<Principal, AgentError> {
        Ok(Principal::try_from_slice(&blob(key)?)?)
    };
    let sender = principal("sender")?;
    let ingress_expiry = map_get(value, "ingress_expiry")
        .and_then(as_u64)
        .ok_or_else(|| invalid("content field ingress_expiry missing"))?;

    match text("request_type")?.as_str() {
        "call" => Ok(RequestContent::Call(CallRequest {
            canister_id: principal("canister_id")?,
            method_name: text("method_name")?,
            arg: blob("arg")?,
            sender,
            ingress_expiry,
            nonce: map_get(value, "nonce").and_then(Value::as_bytes).cloned(),
        })),
        "query" => Ok(RequestContent::Query(QueryRequest {
            canister_id: principal("canister_id")?,
            method_name: text("method_name")?,
            arg: blob("arg")?,
            sender,
            ingress_expiry,
        })),
        "read_state" => {
            let paths = map_get(value, "paths")
                .and_then(Value::as_array)
                .ok_or_else(|| invalid("content field paths missing"))?
                .iter()
                .map(|path| {
                    path.as_array()
                        .ok_or_else(|| invalid("path is not an array"))?
                        .iter()
                        .map(|l| {
                            l.as_bytes()
                                .cloned()
                                .ok_or_else(|| invalid("path label is not bytes"))
                        })
                        .collect::<Result<Vec<_>, _>>()
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(RequestContent::ReadState(ReadStateRequest {
                paths,
                sender,
                ingress_expiry,
            }))
        }
        other => Err(invalid(&format!("unknown request_type {other}"))),
    }
}

fn invalid(msg: &str) -> AgentError {
    AgentError::InvalidResponse(msg.to_string())
}
