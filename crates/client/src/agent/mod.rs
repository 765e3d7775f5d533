// Path: crates/client/src/agent/mod.rs

//! The `Agent`: submits calls, polls their certified status and decodes
//! replies.
//!
//! Each call is an independent lifecycle; the agent holds no per-call state
//! and no locks, so any number of calls may be in flight on one agent.

mod query;

use crate::backoff::Backoff;
use crate::envelope::{sign_request, SignedRequest};
use crate::options::CallOptions;
use crate::status::{lookup_request_status, CallState};
use ica_api::identity::Identity;
use ica_api::scheduler::{within, Scheduler};
use ica_api::transport::Transport;
use ica_candid::{decode_args, encode_args, DecoderConfig, Type, TypeEnv, Value};
use ica_state::{Certificate, CertificateVerifier};
use ica_types::app::{CallRequest, Principal, ReadStateRequest, RequestContent, RequestId};
use ica_types::config::AgentConfig;
use ica_types::error::{AgentError, TransportError};
use rand::Rng;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

const NONCE_LEN: usize = 8;
const EXPIRY_ROUNDING: Duration = Duration::from_secs(60);

/// A client of one replica network, bound to a transport, an identity and a
/// root key.
pub struct Agent {
    transport: Arc<dyn Transport>,
    identity: Arc<dyn Identity>,
    scheduler: Arc<dyn Scheduler>,
    verifier: CertificateVerifier,
    config: AgentConfig,
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("sender", &self.identity.sender())
            .field("root_key", &hex::encode(self.verifier.root_key()))
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Agent {
    /// Builds an agent. `root_key` is the DER-framed BLS key that every
    /// certificate must chain to.
    pub fn new(
        transport: Arc<dyn Transport>,
        identity: Arc<dyn Identity>,
        scheduler: Arc<dyn Scheduler>,
        root_key: Vec<u8>,
        config: AgentConfig,
    ) -> Result<Self, AgentError> {
        config.validate()?;
        Ok(Self {
            transport,
            identity,
            scheduler,
            verifier: CertificateVerifier::new(root_key, &config),
            config,
        })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Polling and retry settings for one call, defaulting to the config.
    pub fn call_options(&self) -> CallOptions {
        CallOptions::from(&self.config)
    }

    pub fn sender(&self) -> Principal {
        self.identity.sender()
    }

    /// `now + ingress_expiry`, rounded down to the minute when more than a
    /// minute away.
    fn ingress_expiry(&self) -> u64 {
        let lifetime = self.config.ingress_expiry();
        let mut expiry = self.scheduler.now().saturating_add(lifetime);
        if lifetime > EXPIRY_ROUNDING {
            let secs = expiry.as_secs();
            expiry = Duration::from_secs(secs - secs % EXPIRY_ROUNDING.as_secs());
        }
        u64::try_from(expiry.as_nanos()).unwrap_or(u64::MAX)
    }

    /// A call request from this agent's sender with a fresh random nonce.
    pub fn call_request(&self, canister_id: Principal, method_name: &str, arg: Vec<u8>) -> CallRequest {
        let nonce: [u8; NONCE_LEN] = rand::thread_rng().gen();
        CallRequest {
            canister_id,
            method_name: method_name.to_string(),
            arg,
            sender: self.identity.sender(),
            ingress_expiry: self.ingress_expiry(),
            nonce: Some(nonce.to_vec()),
        }
    }

    fn sign(&self, content: RequestContent) -> Result<SignedRequest, AgentError> {
        sign_request(&content, self.identity.as_ref())
    }

    /// Signs and sends `request`. Transport failures are returned as-is;
    /// this layer never retries a submission.
    pub async fn submit(&self, request: &CallRequest) -> Result<RequestId, AgentError> {
        self.submit_within(request, None).await
    }

    async fn submit_within(
        &self,
        request: &CallRequest,
        limit: Option<Duration>,
    ) -> Result<RequestId, AgentError> {
        let canister_id = request.canister_id;
        let signed = self.sign(RequestContent::Call(request.clone()))?;
        self.bounded("call", limit, self.transport.call(canister_id, signed.envelope))
            .await?;
        tracing::debug!(
            target: "agent",
            request_id = %signed.request_id,
            canister = %canister_id,
            method = %request.method_name,
            "call submitted"
        );
        Ok(signed.request_id)
    }

    /// Fetches and verifies a certificate covering `paths`.
    pub async fn read_state(
        &self,
        canister_id: Principal,
        paths: Vec<Vec<Vec<u8>>>,
    ) -> Result<Certificate, AgentError> {
        self.read_state_within(canister_id, paths, None).await
    }

    async fn read_state_within(
        &self,
        canister_id: Principal,
        paths: Vec<Vec<Vec<u8>>>,
        limit: Option<Duration>,
    ) -> Result<Certificate, AgentError> {
        let signed = self.sign(RequestContent::ReadState(ReadStateRequest {
            paths,
            sender: self.identity.sender(),
            ingress_expiry: self.ingress_expiry(),
        }))?;
        let bytes = self
            .bounded(
                "read_state",
                limit,
                self.transport.read_state(canister_id, signed.envelope),
            )
            .await?;
        let (certificate, verified) =
            self.verifier
                .verify_bytes(&bytes, &canister_id, self.scheduler.now())?;
        tracing::trace!(
            target: "agent",
            time_ns = verified.time_ns,
            delegations = verified.delegation_depth,
            "certificate verified"
        );
        Ok(certificate)
    }

    /// One status observation of `request_id`.
    pub async fn request_status(
        &self,
        canister_id: Principal,
        request_id: &RequestId,
    ) -> Result<CallState, AgentError> {
        self.request_status_within(canister_id, request_id, None).await
    }

    async fn request_status_within(
        &self,
        canister_id: Principal,
        request_id: &RequestId,
        limit: Option<Duration>,
    ) -> Result<CallState, AgentError> {
        let path = vec![b"request_status".to_vec(), request_id.as_bytes().to_vec()];
        let certificate = self
            .read_state_within(canister_id, vec![path], limit)
            .await?;
        lookup_request_status(&certificate, request_id)
    }

    /// Awaits a transport future, giving up with a transient
    /// [`TransportError::Timeout`] once `limit` has passed.
    async fn bounded<T>(
        &self,
        what: &str,
        limit: Option<Duration>,
        request: impl Future<Output = Result<T, TransportError>>,
    ) -> Result<T, AgentError> {
        let Some(limit) = limit else {
            return Ok(request.await?);
        };
        match within(self.scheduler.as_ref(), limit, request).await {
            Some(result) => Ok(result?),
            None => Err(AgentError::Transport(TransportError::Timeout(format!(
                "{what} did not answer within {} ms",
                limit.as_millis()
            )))),
        }
    }

    /// Polls until the call reaches a terminal state or `poll_timeout` has
    /// elapsed, in which case the result is [`CallState::Unknown`].
    pub async fn poll(
        &self,
        canister_id: Principal,
        request_id: &RequestId,
    ) -> Result<CallState, AgentError> {
        self.poll_with(canister_id, request_id, &self.call_options())
            .await
    }

    /// [`Agent::poll`] with per-call settings.
    ///
    /// Every status read is bounded by the time left before the deadline.
    /// A transient transport failure counts as an `Unknown` observation
    /// unless more than `max_retransmit_attempts` happen in a row, in which
    /// case it is returned. Every other error ends the poll.
    pub async fn poll_with(
        &self,
        canister_id: Principal,
        request_id: &RequestId,
        options: &CallOptions,
    ) -> Result<CallState, AgentError> {
        let started = self.scheduler.now();
        let timeout = options.poll_timeout;
        let mut backoff = Backoff::from_options(options);
        let mut state = CallState::Submitted;
        let mut step = 0u32;
        let mut transient_failures = 0u32;
        loop {
            let remaining = timeout.saturating_sub(self.scheduler.now().saturating_sub(started));
            let observed = match self
                .request_status_within(canister_id, request_id, Some(remaining))
                .await
            {
                Ok(observed) => {
                    transient_failures = 0;
                    observed
                }
                Err(AgentError::Transport(e))
                    if e.is_transient() && transient_failures < options.max_retransmit_attempts =>
                {
                    transient_failures += 1;
                    tracing::warn!(
                        target: "agent",
                        %request_id,
                        error = %e,
                        attempt = transient_failures,
                        max = options.max_retransmit_attempts,
                        "transient read_state failure"
                    );
                    CallState::Unknown
                }
                Err(e) => return Err(e),
            };
            state = state.advance(observed);
            step += 1;
            tracing::debug!(target: "agent", %request_id, step, %state, "poll step");
            if state.is_terminal() {
                return Ok(state);
            }

            let elapsed = self.scheduler.now().saturating_sub(started);
            let Some(left) = timeout.checked_sub(elapsed).filter(|r| !r.is_zero()) else {
                tracing::debug!(
                    target: "agent",
                    %request_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "poll deadline reached"
                );
                return Ok(CallState::Unknown);
            };
            let delay = backoff.next_delay(&mut rand::thread_rng()).min(left);
            self.scheduler.sleep(delay).await;
        }
    }

    /// Submits and polls a call, resubmitting with a fresh nonce after a
    /// `SysTransient` reject up to `max_retransmit_attempts` times. The
    /// result is the request id and final state of the last attempt.
    pub async fn execute(
        &self,
        canister_id: Principal,
        method_name: &str,
        arg: &[u8],
    ) -> Result<(RequestId, CallState), AgentError> {
        self.execute_with(canister_id, method_name, arg, &self.call_options())
            .await
    }

    /// [`Agent::execute`] with per-call settings. Each submission is bounded
    /// by `poll_timeout` as well.
    pub async fn execute_with(
        &self,
        canister_id: Principal,
        method_name: &str,
        arg: &[u8],
        options: &CallOptions,
    ) -> Result<(RequestId, CallState), AgentError> {
        let max = options.max_retransmit_attempts;
        let mut retransmissions = 0u32;
        loop {
            let request = self.call_request(canister_id, method_name, arg.to_vec());
            let request_id = self
                .submit_within(&request, Some(options.poll_timeout))
                .await?;
            let state = self.poll_with(canister_id, &request_id, options).await?;

            if let CallState::Rejected { code, message, .. } = &state {
                if code.is_retryable() && retransmissions < max {
                    retransmissions += 1;
                    tracing::warn!(
                        target: "agent",
                        %request_id,
                        method = method_name,
                        attempt = retransmissions,
                        max,
                        reject_message = %message,
                        "transient reject; resubmitting"
                    );
                    continue;
                }
            }
            tracing::info!(
                target: "agent",
                %request_id,
                canister = %canister_id,
                method = method_name,
                %state,
                retransmissions,
                "call finished"
            );
            return Ok((request_id, state));
        }
    }

    /// Executes a call and returns its reply bytes.
    pub async fn update(
        &self,
        canister_id: Principal,
        method_name: &str,
        arg: &[u8],
    ) -> Result<Vec<u8>, AgentError> {
        self.update_with(canister_id, method_name, arg, &self.call_options())
            .await
    }

    /// [`Agent::update`] with per-call settings.
    pub async fn update_with(
        &self,
        canister_id: Principal,
        method_name: &str,
        arg: &[u8],
        options: &CallOptions,
    ) -> Result<Vec<u8>, AgentError> {
        let started = self.scheduler.now();
        let (request_id, state) = self
            .execute_with(canister_id, method_name, arg, options)
            .await?;
        match state {
            CallState::Replied(reply) => Ok(reply),
            CallState::Rejected {
                code,
                message,
                error_code,
            } => Err(AgentError::CallRejected {
                request_id,
                reject_code: code,
                reject_message: message,
                error_code,
            }),
            CallState::Done => Err(AgentError::ReplyUnavailable(request_id)),
            CallState::Submitted | CallState::Processing | CallState::Unknown => {
                let elapsed = self.scheduler.now().saturating_sub(started);
                Err(AgentError::PollTimeout {
                    request_id,
                    elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                })
            }
        }
    }

    /// Encodes `args`, executes the call and decodes the reply against
    /// `returns`.
    pub async fn update_candid(
        &self,
        canister_id: Principal,
        method_name: &str,
        env: &TypeEnv,
        arg_types: &[Type],
        args: &[Value],
        returns: &[Type],
    ) -> Result<Vec<Value>, AgentError> {
        let arg = encode_args(env, arg_types, args)?;
        let reply = self.update(canister_id, method_name, &arg).await?;
        Ok(decode_args(&reply, env, returns, &self.decoder_config())?)
    }

    pub fn decoder_config(&self) -> DecoderConfig {
        DecoderConfig::from(&self.config)
    }
}
