// Path: crates/client/src/agent/query.rs
use super::Agent;
use ciborium::value::Value;
use ica_types::app::{Principal, QueryRequest, RejectCode, RequestContent, RequestId};
use ica_types::codec::{as_u64, from_cbor_bytes, map_get};
use ica_types::error::AgentError;

impl Agent {
    /// Runs a query call and returns its reply bytes.
    ///
    /// Query replies come straight from one replica and are not certified.
    pub async fn query(
        &self,
        canister_id: Principal,
        method_name: &str,
        arg: &[u8],
    ) -> Result<Vec<u8>, AgentError> {
        let signed = self.sign(RequestContent::Query(QueryRequest {
            canister_id,
            method_name: method_name.to_string(),
            arg: arg.to_vec(),
            sender: self.identity.sender(),
            ingress_expiry: self.ingress_expiry(),
        }))?;
        let body = self.transport.query(canister_id, signed.envelope).await?;
        let reply = parse_query_response(&body, signed.request_id);
        tracing::debug!(
            target: "agent",
            request_id = %signed.request_id,
            method = method_name,
            ok = reply.is_ok(),
            "query answered"
        );
        reply
    }
}

/// Parses `{status: "replied", reply: {arg}}` or
/// `{status: "rejected", reject_code, reject_message, error_code?}`.
pub(crate) fn parse_query_response(body: &[u8], request_id: RequestId) -> Result<Vec<u8>, AgentError> {
    let value = from_cbor_bytes(body).map_err(AgentError::InvalidResponse)?;
    match map_get(&value, "status").and_then(Value::as_text) {
        Some("replied") => map_get(&value, "reply")
            .and_then(|reply| map_get(reply, "arg"))
            .and_then(Value::as_bytes)
            .cloned()
            .ok_or_else(|| AgentError::InvalidResponse("query reply has no arg".into())),
        Some("rejected") => {
            let reject_code = map_get(&value, "reject_code")
                .and_then(as_u64)
                .map(RejectCode::from)
                .ok_or_else(|| AgentError::InvalidResponse("query reject has no code".into()))?;
            let reject_message = map_get(&value, "reject_message")
                .and_then(Value::as_text)
                .unwrap_or_default()
                .to_string();
            let error_code = map_get(&value, "error_code")
                .and_then(Value::as_text)
                .map(str::to_string);
            Err(AgentError::CallRejected {
                request_id,
                reject_code,
                reject_message,
                error_code,
            })
        }
        other => Err(AgentError::InvalidResponse(format!(
            "unexpected query status {other:?}"
        ))),
    }
}
