// Path: crates/test_utils/src/replica/mod.rs
//! An in-process replica that speaks the agent's `Transport`.
//!
//! Calls are answered from per-method scripts of status observations. Every
//! `read_state` certificate is signed with a real BLS key, either the root key
//! directly or a subnet key delegated from it.

use crate::fixtures::{canister_id, status_subtree, subnet_id, time_leaf, sign_tree, SubnetDelegation};
use async_trait::async_trait;
use ciborium::value::Value;
use ica_api::crypto::DerPublicKey;
use ica_api::scheduler::Scheduler;
use ica_api::transport::Transport;
use ica_client::{CallState, Envelope};
use ica_crypto::sign::bls::BlsKeyPair;
use ica_state::HashTree;
use ica_types::app::{CallRequest, Principal, RejectCode, RequestContent, RequestId};
use ica_types::codec::{text_map, to_cbor_bytes};
use ica_types::error::{CertificateError, TransportError};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard};

const DEFAULT_REPLY: &[u8] = b"DIDL\x00\x00";

/// The canned answer to a query method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryAnswer {
    Reply(Vec<u8>),
    Reject(RejectCode, String),
}

#[derive(Default)]
struct ReplicaState {
    scripts: HashMap<String, VecDeque<Vec<CallState>>>,
    statuses: BTreeMap<RequestId, VecDeque<CallState>>,
    submissions: Vec<CallRequest>,
    queries: HashMap<String, QueryAnswer>,
    call_failures: VecDeque<TransportError>,
    read_state_failures: VecDeque<TransportError>,
    read_state_hangs: usize,
    read_state_count: usize,
}

impl ReplicaState {
    /// The next observation of `id`. The last scripted status sticks.
    fn observe(&mut self, id: &RequestId) -> Option<CallState> {
        let queue = self.statuses.get_mut(id)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

pub struct MockReplica {
    root: BlsKeyPair,
    subnet: Option<SubnetDelegation>,
    clock: Arc<dyn Scheduler>,
    state: Mutex<ReplicaState>,
}

impl MockReplica {
    /// A replica that signs with its root key and reads time from `clock`.
    pub fn new(clock: Arc<dyn Scheduler>) -> Self {
        Self {
            root: BlsKeyPair::from_seed(b"mock-replica-root"),
            subnet: None,
            clock,
            state: Mutex::new(ReplicaState::default()),
        }
    }

    /// Signs certificates with a subnet key whose delegation covers exactly
    /// `ranges`.
    pub fn with_delegation(
        mut self,
        ranges: &[(Principal, Principal)],
    ) -> Result<Self, CertificateError> {
        self.subnet = Some(SubnetDelegation::new(
            &self.root,
            subnet_id(),
            BlsKeyPair::from_seed(b"mock-replica-subnet"),
            ranges,
            self.clock.now(),
        )?);
        Ok(self)
    }

    /// Delegates to a subnet hosting only the fixture canister.
    pub fn with_default_delegation(self) -> Result<Self, CertificateError> {
        let canister = canister_id();
        self.with_delegation(&[(canister, canister)])
    }

    /// The DER-encoded root key agents must trust.
    pub fn root_key(&self) -> Vec<u8> {
        self.root.public_key().to_der()
    }

    fn lock(&self) -> MutexGuard<'_, ReplicaState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queues the observations the next call to `method` will go through.
    /// Calls without a script reply with an empty Candid message at once.
    pub fn script(&self, method: &str, observations: Vec<CallState>) {
        self.lock()
            .scripts
            .entry(method.to_string())
            .or_default()
            .push_back(observations);
    }

    pub fn answer_query(&self, method: &str, answer: QueryAnswer) {
        self.lock().queries.insert(method.to_string(), answer);
    }

    pub fn fail_next_call(&self, error: TransportError) {
        self.lock().call_failures.push_back(error);
    }

    pub fn fail_next_read_state(&self, error: TransportError) {
        self.lock().read_state_failures.push_back(error);
    }

    /// The next `read_state` request is never answered.
    pub fn hang_next_read_state(&self) {
        self.lock().read_state_hangs += 1;
    }

    fn take_hang(&self) -> bool {
        let mut state = self.lock();
        let hang = state.read_state_hangs > 0;
        state.read_state_hangs = state.read_state_hangs.saturating_sub(1);
        hang
    }

    /// Every accepted call, in submission order.
    pub fn submissions(&self) -> Vec<CallRequest> {
        self.lock().submissions.clone()
    }

    /// How many `read_state` requests were answered, failures included and
    /// hung ones not.
    pub fn read_state_count(&self) -> usize {
        self.lock().read_state_count
    }

    fn certify(&self, request_status: Vec<(RequestId, HashTree)>) -> Result<Vec<u8>, TransportError> {
        let mut entries = vec![(b"time".to_vec(), time_leaf(self.clock.now()))];
        if !request_status.is_empty() {
            let statuses = request_status
                .into_iter()
                .map(|(id, subtree)| (id.as_ref().to_vec(), subtree));
            entries.push((b"request_status".to_vec(), HashTree::from_labeled(statuses)));
        }
        let tree = HashTree::from_labeled(entries);
        let certificate = match &self.subnet {
            Some(subnet) => sign_tree(tree, &subnet.key, Some(subnet.delegation.clone())),
            None => sign_tree(tree, &self.root, None),
        };
        certificate.to_cbor_bytes().map_err(|e| internal(&e.to_string()))
    }
}

fn bad_request(message: &str) -> TransportError {
    TransportError::Http {
        status: 400,
        body: message.to_string(),
    }
}

fn internal(message: &str) -> TransportError {
    TransportError::Http {
        status: 500,
        body: message.to_string(),
    }
}

fn open(envelope: &[u8]) -> Result<Envelope, TransportError> {
    let envelope = Envelope::from_cbor_bytes(envelope).map_err(|e| bad_request(&e.to_string()))?;
    envelope
        .verify_sender()
        .map_err(|e| bad_request(&e.to_string()))?;
    Ok(envelope)
}

#[async_trait]
impl Transport for MockReplica {
    async fn call(&self, _: Principal, envelope: Vec<u8>) -> Result<(), TransportError> {
        let envelope = open(&envelope)?;
        let request_id = envelope.request_id();
        let RequestContent::Call(request) = envelope.content else {
            return Err(bad_request("expected a call envelope"));
        };
        let mut state = self.lock();
        if let Some(error) = state.call_failures.pop_front() {
            return Err(error);
        }
        let observations = state
            .scripts
            .get_mut(&request.method_name)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| vec![CallState::Replied(DEFAULT_REPLY.to_vec())]);
        state.statuses.insert(request_id, observations.into());
        state.submissions.push(request);
        Ok(())
    }

    async fn read_state(&self, _: Principal, envelope: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        let envelope = open(&envelope)?;
        let RequestContent::ReadState(request) = envelope.content else {
            return Err(bad_request("expected a read_state envelope"));
        };
        if self.take_hang() {
            match std::future::pending::<Infallible>().await {}
        }
        let request_status = {
            let mut state = self.lock();
            state.read_state_count += 1;
            if let Some(error) = state.read_state_failures.pop_front() {
                return Err(error);
            }
            let mut certified = Vec::new();
            for path in &request.paths {
                let [scope, id] = path.as_slice() else {
                    continue;
                };
                if scope.as_slice() != b"request_status" {
                    continue;
                }
                let Ok(id) = <[u8; 32]>::try_from(id.as_slice()).map(RequestId) else {
                    continue;
                };
                if let Some(subtree) = state.observe(&id).as_ref().and_then(status_subtree) {
                    certified.push((id, subtree));
                }
            }
            certified
        };
        self.certify(request_status)
    }

    async fn query(&self, _: Principal, envelope: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        let envelope = open(&envelope)?;
        let RequestContent::Query(request) = envelope.content else {
            return Err(bad_request("expected a query envelope"));
        };
        let answer = self.lock().queries.get(&request.method_name).cloned().unwrap_or_else(|| {
            QueryAnswer::Reject(
                RejectCode::DestinationInvalid,
                format!("no query method {}", request.method_name),
            )
        });
        let response = match answer {
            QueryAnswer::Reply(arg) => text_map([
                ("status", Value::Text("replied".into())),
                ("reply", text_map([("arg", Value::Bytes(arg))])),
            ]),
            QueryAnswer::Reject(code, message) => text_map([
                ("status", Value::Text("rejected".into())),
                ("reject_code", Value::Integer(code.as_u64().into())),
                ("reject_message", Value::Text(message)),
            ]),
        };
        to_cbor_bytes(&response).map_err(|e| internal(&e))
    }
}
