//! Session lifecycle integration tests
//!
//! Covers login, token renewal after SESSION_INVALID, the post-login hook,
//! and the fail-fast path when no login can be replayed.

mod common;

use common::{failure, success, MockTransport};
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use xapi_client::{Client, ClientBuilder};
use xapi_core::{Error, ErrorKind};

fn client_with(transport: &Arc<MockTransport>) -> Client {
    ClientBuilder::new("ws://host/")
        .with_transport(transport.clone())
        .build()
        .unwrap()
}

#[tokio::test]
async fn login_stores_token_and_runs_hook_once() {
    let transport = Arc::new(MockTransport::script(vec![success(json!(
        "OpaqueRef:sess-1"
    ))]));
    let client = client_with(&transport);

    let hook_runs = Arc::new(AtomicU32::new(0));
    let counter = hook_runs.clone();
    client
        .after_login(Box::new(move |_client: &Client| {
            let counter = counter.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        }))
        .await;

    client.login_with_password("root", "pw").await.unwrap();

    assert_eq!(
        client.session_token().await,
        Some("OpaqueRef:sess-1".to_string())
    );
    assert_eq!(hook_runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn session_invalid_triggers_one_relogin_and_one_retry() {
    let transport = Arc::new(MockTransport::script(vec![
        success(json!("OpaqueRef:sess-1")),      // login
        failure(&["SESSION_INVALID"]),           // VM.get_all rejected
        success(json!("OpaqueRef:sess-2")),      // replayed login
        success(json!(["vm1", "vm2"])),          // retried VM.get_all
    ]));
    let client = client_with(&transport);

    let hook_runs = Arc::new(AtomicU32::new(0));
    let counter = hook_runs.clone();
    client
        .after_login(Box::new(move |_client: &Client| {
            let counter = counter.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        }))
        .await;

    client.login_with_password("root", "pw").await.unwrap();
    let vms = client.vm().call("get_all", vec![]).await.unwrap();

    assert_eq!(vms, json!(["vm1", "vm2"]));
    assert_eq!(hook_runs.load(Ordering::SeqCst), 2);

    let calls = transport.calls();
    let names: Vec<&str> = calls.iter().map(|(m, _)| m.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "session.login_with_password",
            "VM.get_all",
            "session.login_with_password",
            "VM.get_all",
        ]
    );
    // The replayed login reuses the recorded credentials
    assert_eq!(calls[2].1, vec![json!("root"), json!("pw")]);
    // The retried call carries the fresh token
    assert_eq!(calls[3].1, vec![json!("OpaqueRef:sess-2")]);
}

#[tokio::test]
async fn second_session_invalid_propagates() {
    let transport = Arc::new(MockTransport::script(vec![
        success(json!("OpaqueRef:sess-1")),
        failure(&["SESSION_INVALID"]),
        success(json!("OpaqueRef:sess-2")),
        failure(&["SESSION_INVALID"]),
    ]));
    let client = client_with(&transport);

    client.login_with_password("root", "pw").await.unwrap();
    let error = client.vm().call("get_all", vec![]).await.unwrap_err();

    assert!(matches!(error, Error::SessionInvalid));
    // Exactly one relogin, exactly one retry: no loop
    assert_eq!(transport.call_count(), 4);
}

#[tokio::test]
async fn failed_relogin_propagates_without_further_retries() {
    let transport = Arc::new(MockTransport::script(vec![
        success(json!("OpaqueRef:sess-1")),
        failure(&["SESSION_INVALID"]),
        failure(&["SESSION_AUTHENTICATION_FAILED", "root"]),
    ]));
    let client = client_with(&transport);

    client.login_with_password("root", "pw").await.unwrap();
    let error = client.vm().call("get_all", vec![]).await.unwrap_err();

    match error {
        Error::Api(api) => assert_eq!(api.kind, ErrorKind::SessionAuthenticationFailed),
        other => panic!("Expected Api error, got {:?}", other),
    }
    assert_eq!(transport.call_count(), 3);
}

#[tokio::test]
async fn session_invalid_without_prior_login_fails_fast() {
    let transport = Arc::new(MockTransport::script(vec![failure(&["SESSION_INVALID"])]));
    let client = client_with(&transport);

    let error = client.host().call("get_all", vec![]).await.unwrap_err();

    assert!(matches!(error, Error::LoginRequired));
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn hook_failure_aborts_login() {
    let transport = Arc::new(MockTransport::script(vec![success(json!(
        "OpaqueRef:sess-1"
    ))]));
    let client = client_with(&transport);

    client
        .after_login(Box::new(|_client: &Client| {
            Box::pin(async move { Err(Error::Transport("subscription failed".to_string())) })
        }))
        .await;

    let error = client.login_with_password("root", "pw").await.unwrap_err();
    assert!(matches!(error, Error::Transport(_)));
}

#[tokio::test]
async fn hook_can_call_back_into_the_client() {
    let transport = Arc::new(MockTransport::script(vec![
        success(json!("OpaqueRef:sess-1")), // login
        success(json!(null)),               // event.register from the hook
    ]));
    let client = client_with(&transport);

    client
        .after_login(Box::new(|client: &Client| {
            Box::pin(async move {
                client.event().call("register", vec![json!(["*"])]).await?;
                Ok(())
            })
        }))
        .await;

    client.login_with_password("root", "pw").await.unwrap();

    let calls = transport.calls();
    assert_eq!(calls[1].0, "event.register");
    // The hook runs after the token is installed
    assert_eq!(calls[1].1[0], json!("OpaqueRef:sess-1"));
}

#[tokio::test]
async fn hook_driven_relogin_completes() {
    // The hook's own call is rejected with SESSION_INVALID, which replays
    // the login and runs the hook again from inside the first hook run.
    // The whole login must still finish.
    let transport = Arc::new(MockTransport::script(vec![
        success(json!("OpaqueRef:sess-1")), // login
        failure(&["SESSION_INVALID"]),      // hook's event.register rejected
        success(json!("OpaqueRef:sess-2")), // replayed login
        success(json!(null)),               // event.register from the inner hook run
        success(json!(null)),               // retried event.register
    ]));
    let client = client_with(&transport);

    client
        .after_login(Box::new(|client: &Client| {
            Box::pin(async move {
                client.event().call("register", vec![json!(["*"])]).await?;
                Ok(())
            })
        }))
        .await;

    tokio::time::timeout(
        Duration::from_secs(5),
        client.login_with_password("root", "pw"),
    )
    .await
    .expect("login did not complete")
    .unwrap();

    let names: Vec<String> = transport.calls().into_iter().map(|(m, _)| m).collect();
    assert_eq!(
        names,
        vec![
            "session.login_with_password",
            "event.register",
            "session.login_with_password",
            "event.register",
            "event.register",
        ]
    );
    assert_eq!(
        client.session_token().await,
        Some("OpaqueRef:sess-2".to_string())
    );
}

#[tokio::test]
async fn hook_failure_during_relogin_propagates() {
    let transport = Arc::new(MockTransport::script(vec![
        success(json!("OpaqueRef:sess-1")),
        failure(&["SESSION_INVALID"]),
        success(json!("OpaqueRef:sess-2")),
    ]));
    let client = client_with(&transport);

    // Succeeds on the initial login, fails on the relogin run
    let runs = Arc::new(AtomicU32::new(0));
    let counter = runs.clone();
    client
        .after_login(Box::new(move |_client: &Client| {
            let run = counter.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                if run == 0 {
                    Ok(())
                } else {
                    Err(Error::Transport("subscription failed".to_string()))
                }
            })
        }))
        .await;

    client.login_with_password("root", "pw").await.unwrap();
    let error = client.vm().call("get_all", vec![]).await.unwrap_err();

    assert!(matches!(error, Error::Transport(_)));
    assert_eq!(runs.load(Ordering::SeqCst), 2);
    // The interrupted call is not retried after the hook failure
    assert_eq!(transport.call_count(), 3);
}

#[tokio::test]
async fn login_with_password_version_sends_the_version_argument() {
    let transport = Arc::new(MockTransport::script(vec![success(json!(
        "OpaqueRef:sess-1"
    ))]));
    let client = client_with(&transport);

    client
        .login_with_password_version("root", "pw", "2.3")
        .await
        .unwrap();

    let calls = transport.calls();
    assert_eq!(calls[0].0, "session.login_with_password");
    assert_eq!(calls[0].1, vec![json!("root"), json!("pw"), json!("2.3")]);
}

#[tokio::test]
async fn relogin_replays_the_most_recent_login() {
    let transport = Arc::new(MockTransport::script(vec![
        success(json!("OpaqueRef:sess-a")), // login as alice
        success(json!("OpaqueRef:sess-b")), // login as bob
        failure(&["SESSION_INVALID"]),
        success(json!("OpaqueRef:sess-b2")), // replay: bob again
        success(json!([])),
    ]));
    let client = client_with(&transport);

    client.login_with_password("alice", "pw-a").await.unwrap();
    client.login_with_password("bob", "pw-b").await.unwrap();
    client.vm().call("get_all", vec![]).await.unwrap();

    let calls = transport.calls();
    assert_eq!(calls[3].0, "session.login_with_password");
    assert_eq!(calls[3].1, vec![json!("bob"), json!("pw-b")]);
}

#[tokio::test]
async fn logout_clears_the_session_token() {
    let transport = Arc::new(MockTransport::script(vec![
        success(json!("OpaqueRef:sess-1")),
        success(json!(null)),
    ]));
    let client = client_with(&transport);

    client.login_with_password("root", "pw").await.unwrap();
    client.logout().await.unwrap();

    assert_eq!(client.session_token().await, None);

    let calls = transport.calls();
    assert_eq!(calls[1].0, "session.logout");
    assert_eq!(calls[1].1, vec![json!("OpaqueRef:sess-1")]);
}

#[tokio::test]
async fn domain_errors_surface_with_payload() {
    let transport = Arc::new(MockTransport::script(vec![
        success(json!("OpaqueRef:sess-1")),
        failure(&["VM_BAD_POWER_STATE", "running", "halted"]),
    ]));
    let client = client_with(&transport);

    client.login_with_password("root", "pw").await.unwrap();
    let error = client
        .vm()
        .call("start", vec![json!("OpaqueRef:vm")])
        .await
        .unwrap_err();

    match error {
        Error::Api(api) => {
            assert_eq!(api.kind, ErrorKind::VmBadPowerState);
            assert_eq!(api.details, vec!["running", "halted"]);
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
    // Domain errors are never retried by the client
    assert_eq!(transport.call_count(), 2);
}
