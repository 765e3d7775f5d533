// Path: crates/client/tests/call_lifecycle.rs
//! End-to-end call scenarios against the in-process replica.

use ica_api::identity::{AnonymousIdentity, Identity};
use ica_candid::{decode_one, encode_one, DecoderConfig, Type, TypeEnv, Value};
use ica_client::{Agent, CallOptions, CallState};
use ica_test_utils::fixtures::{canister_id, GENESIS};
use ica_test_utils::randomness::TestRng;
use ica_test_utils::{ManualScheduler, MockReplica, QueryAnswer};
use ica_types::app::RejectCode;
use ica_types::config::AgentConfig;
use ica_types::error::{AgentError, TransportError};
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    replica: Arc<MockReplica>,
    scheduler: Arc<ManualScheduler>,
    agent: Agent,
}

fn harness_with(config: AgentConfig, identity: Arc<dyn Identity>) -> Harness {
    let scheduler = Arc::new(ManualScheduler::new(GENESIS));
    let replica = Arc::new(MockReplica::new(scheduler.clone()));
    let agent = Agent::new(
        replica.clone(),
        identity,
        scheduler.clone(),
        replica.root_key(),
        config,
    )
    .unwrap();
    Harness {
        replica,
        scheduler,
        agent,
    }
}

fn harness() -> Harness {
    harness_with(AgentConfig::default(), Arc::new(AnonymousIdentity))
}

fn rejected(code: RejectCode, message: &str) -> CallState {
    CallState::Rejected {
        code,
        message: message.to_string(),
        error_code: None,
    }
}

#[tokio::test]
async fn test_call_replies_after_processing() {
    let h = harness();
    h.replica.script(
        "inc",
        vec![CallState::Processing, CallState::Replied(b"DIDL\x00\x01\x7d\x01".to_vec())],
    );

    let (request_id, state) = h.agent.execute(canister_id(), "inc", &[]).await.unwrap();
    assert_eq!(state, CallState::Replied(b"DIDL\x00\x01\x7d\x01".to_vec()));

    // One poll saw Processing, the next saw the reply, and nothing after.
    assert_eq!(h.replica.read_state_count(), 2);
    assert_eq!(h.scheduler.sleeps().len(), 1);

    let submissions = h.replica.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].method_name, "inc");
    assert!(submissions[0].arg.is_empty());
    assert!(submissions[0].sender.is_anonymous());

    // The reply stays readable under the same request id.
    assert_eq!(
        h.agent.request_status(canister_id(), &request_id).await.unwrap(),
        state
    );
}

#[tokio::test]
async fn test_first_poll_can_observe_processing() {
    let h = harness();
    h.replica
        .script("inc", vec![CallState::Processing, CallState::Replied(vec![])]);
    let request = h.agent.call_request(canister_id(), "inc", vec![]);
    let request_id = h.agent.submit(&request).await.unwrap();

    assert_eq!(
        h.agent.request_status(canister_id(), &request_id).await.unwrap(),
        CallState::Processing
    );
    assert_eq!(
        h.agent.poll(canister_id(), &request_id).await.unwrap(),
        CallState::Replied(vec![])
    );
    assert_eq!(h.replica.read_state_count(), 2);
}

#[tokio::test]
async fn test_transient_reject_is_resubmitted_with_a_fresh_nonce() {
    let h = harness();
    h.replica
        .script("inc", vec![rejected(RejectCode::SysTransient, "subnet overloaded")]);
    h.replica
        .script("inc", vec![CallState::Processing, CallState::Replied(b"ok".to_vec())]);

    let (_, state) = h.agent.execute(canister_id(), "inc", b"arg").await.unwrap();
    assert_eq!(state, CallState::Replied(b"ok".to_vec()));

    let submissions = h.replica.submissions();
    assert_eq!(submissions.len(), 2);
    assert_eq!(submissions[0].method_name, submissions[1].method_name);
    assert_eq!(submissions[0].arg, submissions[1].arg);
    assert_ne!(submissions[0].nonce, submissions[1].nonce);
}

#[tokio::test]
async fn test_retransmission_budget_is_bounded() {
    let config = AgentConfig {
        max_retransmit_attempts: 1,
        ..AgentConfig::default()
    };
    let h = harness_with(config, Arc::new(AnonymousIdentity));
    for _ in 0..3 {
        h.replica
            .script("inc", vec![rejected(RejectCode::SysTransient, "busy")]);
    }

    match h.agent.update(canister_id(), "inc", &[]).await {
        Err(AgentError::CallRejected { reject_code, .. }) => {
            assert_eq!(reject_code, RejectCode::SysTransient)
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(h.replica.submissions().len(), 2);
}

#[tokio::test]
async fn test_canister_reject_is_not_retried() {
    let h = harness();
    h.replica.script(
        "inc",
        vec![CallState::Rejected {
            code: RejectCode::CanisterReject,
            message: "not allowed".into(),
            error_code: Some("IC0406".into()),
        }],
    );

    match h.agent.update(canister_id(), "inc", &[]).await {
        Err(AgentError::CallRejected {
            reject_code,
            reject_message,
            error_code,
            ..
        }) => {
            assert_eq!(reject_code, RejectCode::CanisterReject);
            assert_eq!(reject_message, "not allowed");
            assert_eq!(error_code.as_deref(), Some("IC0406"));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(h.replica.submissions().len(), 1);
}

#[tokio::test]
async fn test_poll_gives_up_at_the_deadline() {
    let config = AgentConfig {
        poll_timeout_ms: 10_000,
        ..AgentConfig::default()
    };
    let h = harness_with(config, Arc::new(AnonymousIdentity));
    h.replica.script("slow", vec![CallState::Processing]);

    match h.agent.update(canister_id(), "slow", &[]).await {
        Err(AgentError::PollTimeout { elapsed_ms, .. }) => assert_eq!(elapsed_ms, 10_000),
        other => panic!("unexpected {other:?}"),
    }
    // The final sleep is clipped to the deadline.
    assert_eq!(h.scheduler.total_slept(), Duration::from_secs(10));
    assert!(h
        .scheduler
        .sleeps()
        .iter()
        .all(|d| *d <= Duration::from_millis(5_000)));
}

#[tokio::test]
async fn test_poll_of_unknown_request_times_out_as_unknown() {
    let config = AgentConfig {
        poll_timeout_ms: 2_000,
        ..AgentConfig::default()
    };
    let h = harness_with(config, Arc::new(AnonymousIdentity));
    let state = h
        .agent
        .poll(canister_id(), &ica_types::app::RequestId([7; 32]))
        .await
        .unwrap();
    assert_eq!(state, CallState::Unknown);
}

#[tokio::test]
async fn test_transient_read_state_failure_is_tolerated() {
    let h = harness();
    h.replica
        .fail_next_read_state(TransportError::Unreachable("connection reset".into()));

    let reply = h.agent.update(canister_id(), "inc", &[]).await.unwrap();
    assert_eq!(reply, b"DIDL\x00\x00");
    assert_eq!(h.replica.read_state_count(), 2);
}

#[tokio::test]
async fn test_repeated_read_state_failures_exhaust_the_budget() {
    let config = AgentConfig {
        max_retransmit_attempts: 1,
        ..AgentConfig::default()
    };
    let h = harness_with(config, Arc::new(AnonymousIdentity));
    for _ in 0..10 {
        h.replica
            .fail_next_read_state(TransportError::Unreachable("connection reset".into()));
    }

    assert!(matches!(
        h.agent.update(canister_id(), "inc", &[]).await,
        Err(AgentError::Transport(TransportError::Unreachable(_)))
    ));
    // One failure is tolerated; the second in a row ends the call.
    assert_eq!(h.replica.read_state_count(), 2);
    assert_eq!(h.replica.submissions().len(), 1);
}

#[tokio::test]
async fn test_hung_read_state_is_cut_off_at_the_deadline() {
    let config = AgentConfig {
        poll_timeout_ms: 10_000,
        ..AgentConfig::default()
    };
    let h = harness_with(config, Arc::new(AnonymousIdentity));
    h.replica.hang_next_read_state();

    match h.agent.update(canister_id(), "inc", &[]).await {
        Err(AgentError::PollTimeout { elapsed_ms, .. }) => assert_eq!(elapsed_ms, 10_000),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(h.scheduler.sleeps(), vec![Duration::from_secs(10)]);
    assert_eq!(h.replica.read_state_count(), 0);
}

#[tokio::test]
async fn test_calls_can_use_their_own_deadlines() {
    let h = harness();
    h.replica.script("short", vec![CallState::Processing]);
    h.replica.script("long", vec![CallState::Processing]);
    let defaults = h.agent.call_options();
    let short = defaults.with_poll_timeout(Duration::from_secs(2));
    let long = defaults.with_poll_timeout(Duration::from_secs(20));

    let (a, b) = tokio::join!(
        h.agent.update_with(canister_id(), "short", &[], &short),
        h.agent.update_with(canister_id(), "long", &[], &long),
    );
    match (a, b) {
        (
            Err(AgentError::PollTimeout { elapsed_ms: a, .. }),
            Err(AgentError::PollTimeout { elapsed_ms: b, .. }),
        ) => {
            assert_eq!(a, 2_000);
            assert_eq!(b, 20_000);
        }
        other => panic!("unexpected {other:?}"),
    }
    // The agent-wide default is untouched.
    assert_eq!(h.agent.config().poll_timeout_ms, 300_000);
}

#[tokio::test]
async fn test_per_call_retransmit_budget() {
    let h = harness();
    for _ in 0..3 {
        h.replica
            .script("inc", vec![rejected(RejectCode::SysTransient, "busy")]);
    }
    let options = h.agent.call_options().with_max_retransmit_attempts(0);

    assert!(matches!(
        h.agent.update_with(canister_id(), "inc", &[], &options).await,
        Err(AgentError::CallRejected {
            reject_code: RejectCode::SysTransient,
            ..
        })
    ));
    assert_eq!(h.replica.submissions().len(), 1);
}

#[tokio::test]
async fn test_permanent_read_state_failure_is_surfaced() {
    let h = harness();
    h.replica.fail_next_read_state(TransportError::Http {
        status: 403,
        body: "forbidden".into(),
    });
    assert!(matches!(
        h.agent.update(canister_id(), "inc", &[]).await,
        Err(AgentError::Transport(TransportError::Http { status: 403, .. }))
    ));
}

#[tokio::test]
async fn test_failed_submission_is_not_retried() {
    let h = harness();
    h.replica
        .fail_next_call(TransportError::Timeout("no answer".into()));
    assert!(matches!(
        h.agent.update(canister_id(), "inc", &[]).await,
        Err(AgentError::Transport(TransportError::Timeout(_)))
    ));
    assert!(h.replica.submissions().is_empty());
    assert_eq!(h.replica.read_state_count(), 0);
}

#[tokio::test]
async fn test_done_without_reply_is_unavailable() {
    let h = harness();
    h.replica.script("inc", vec![CallState::Done]);
    assert!(matches!(
        h.agent.update(canister_id(), "inc", &[]).await,
        Err(AgentError::ReplyUnavailable(_))
    ));
}

#[tokio::test]
async fn test_signed_identity_is_accepted() {
    let identity = TestRng::default().identity().unwrap();
    let sender = identity.sender();
    let h = harness_with(AgentConfig::default(), Arc::new(identity));

    h.agent.update(canister_id(), "inc", &[]).await.unwrap();
    assert_eq!(h.replica.submissions()[0].sender, sender);
}

#[tokio::test]
async fn test_concurrent_calls_are_independent() {
    let h = harness();
    h.replica.script("a", vec![CallState::Processing, CallState::Replied(b"a".to_vec())]);
    h.replica.script("b", vec![CallState::Replied(b"b".to_vec())]);

    let (a, b) = tokio::join!(
        h.agent.update(canister_id(), "a", &[]),
        h.agent.update(canister_id(), "b", &[]),
    );
    assert_eq!(a.unwrap(), b"a");
    assert_eq!(b.unwrap(), b"b");
}

#[tokio::test]
async fn test_update_candid_encodes_and_decodes() {
    let h = harness();
    let env = TypeEnv::new();
    let reply = encode_one(&env, &Type::Text, &Value::Text("hello, world".into())).unwrap();
    h.replica
        .script("greet", vec![CallState::Replied(reply)]);

    let values = h
        .agent
        .update_candid(
            canister_id(),
            "greet",
            &env,
            &[Type::Text],
            &[Value::Text("world".into())],
            &[Type::Text],
        )
        .await
        .unwrap();
    assert_eq!(values, vec![Value::Text("hello, world".into())]);

    let sent = &h.replica.submissions()[0].arg;
    assert_eq!(
        decode_one(sent, &env, &Type::Text, &DecoderConfig::default()).unwrap(),
        Value::Text("world".into())
    );
}

#[tokio::test]
async fn test_update_candid_rejects_mistyped_reply() {
    let h = harness();
    let env = TypeEnv::new();
    let reply = encode_one(&env, &Type::Text, &Value::Text("not a bool".into())).unwrap();
    h.replica.script("flag", vec![CallState::Replied(reply)]);

    assert!(matches!(
        h.agent
            .update_candid(canister_id(), "flag", &env, &[], &[], &[Type::Bool])
            .await,
        Err(AgentError::Candid(_))
    ));
}

#[tokio::test]
async fn test_query_round_trip() {
    let h = harness();
    h.replica
        .answer_query("get", QueryAnswer::Reply(b"DIDL\x00\x01\x71\x02hi".to_vec()));

    let reply = h.agent.query(canister_id(), "get", &[]).await.unwrap();
    assert_eq!(reply, b"DIDL\x00\x01\x71\x02hi");

    assert!(matches!(
        h.agent.query(canister_id(), "missing", &[]).await,
        Err(AgentError::CallRejected {
            reject_code: RejectCode::DestinationInvalid,
            ..
        })
    ));
}
