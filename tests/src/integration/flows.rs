//! # Integration Test Flows
//!
//! Page, bridge and host wired together over a real channel.
//!
//! ## Flows Tested:
//!
//! 1. **Fast paths**: requests answered from provider state never reach the host
//! 2. **Forward / complete**: envelope out, `resolveRequest` / `rejectRequest` back
//! 3. **Host control**: account and chain changes fan out to page listeners
//! 4. **Deferred work**: replays and `sendAsync` callbacks wait for the next turn

use super::harness::{EventLog, TestHost};
use dapp_bridge::{
    codes, listener, BridgeConfig, ChainDescriptor, CompletionOutcome, DappBridge,
    DispatchReport, EventName, HostCompletion, HostControl, HostResult, InMemoryStorage,
    JsonRpcResponse, MpscChannel, ProviderRpcError, RequestPayload, UnavailableStorage,
};
use dapp_bridge::domain::markers;
use dapp_bridge::DurableStorage;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;

// =============================================================================
// TEST FIXTURES
// =============================================================================

const ALICE: &str = "0x00000000000000000000000000000000000a11ce";
const BOB: &str = "0x0000000000000000000000000000000000000b0b";

fn send_tx() -> RequestPayload {
    RequestPayload::new("eth_sendTransaction").with_params(json!([{ "to": BOB, "value": "0x1" }]))
}

/// Wait for the bridge to post its next envelope while a spawned task runs.
async fn wait_envelope(host: &mut TestHost) -> dapp_bridge::HostEnvelope {
    for _ in 0..100 {
        if let Some(envelope) = host.next_envelope() {
            return envelope;
        }
        tokio::task::yield_now().await;
    }
    panic!("bridge never posted an envelope");
}

// =============================================================================
// FAST PATHS
// =============================================================================

#[tokio::test]
async fn test_chain_queries_answered_without_host() {
    let mut host = TestHost::new();
    let provider = host.bridge.provider();

    let chain_id = provider.request(RequestPayload::new("eth_chainId")).await;
    let version = provider.request(RequestPayload::new("net_version")).await;

    assert_eq!(chain_id.unwrap(), json!("0x1"));
    assert_eq!(version.unwrap(), json!("1"));
    assert!(host.next_envelope().is_none());
    assert_eq!(host.bridge.pending_count(), 0);
}

#[tokio::test]
async fn test_accounts_forwarded_until_selected_then_local() {
    let mut host = TestHost::new();

    let mut first = host.bridge.provider().request(RequestPayload::new("eth_accounts"));
    let envelope = host.next_envelope().expect("forwarded while disconnected");
    assert_eq!(envelope.method, "eth_accounts");
    assert!(first.try_result().is_none());

    host.bridge.controller().set_account(ALICE);
    let second = host.bridge.provider().request(RequestPayload::new("eth_accounts")).await;
    assert_eq!(second.unwrap(), json!([ALICE]));
    assert!(host.next_envelope().is_none());

    // The earlier request still waits for its own completion
    assert_eq!(host.bridge.pending_count(), 1);
    host.bridge
        .host()
        .resolve_request(&envelope.id, HostResult::from(json!([ALICE])));
    assert_eq!(first.await.unwrap(), json!([ALICE]));
}

#[tokio::test]
async fn test_permissions_answered_locally_when_connected() {
    let mut host = TestHost::new();
    host.bridge.controller().set_account(ALICE);

    let granted = host
        .bridge
        .provider()
        .request(
            RequestPayload::new("wallet_requestPermissions")
                .with_params(json!([{ "eth_accounts": {} }])),
        )
        .await
        .unwrap();

    assert_eq!(granted[0]["parentCapability"], "eth_accounts");
    assert_eq!(granted[0]["caveats"][0]["value"], json!([ALICE]));
    assert!(host.next_envelope().is_none());
}

#[tokio::test]
async fn test_net_version_follows_chain_switch() {
    let host = TestHost::new();
    host.bridge.controller().switch_chain("0x89");

    let provider = host.bridge.provider();
    assert_eq!(provider.chain_id(), "0x89");
    assert_eq!(provider.network_version(), "89");
    assert_eq!(
        provider.request(RequestPayload::new("net_version")).await.unwrap(),
        json!("89")
    );
}

// =============================================================================
// FORWARD AND COMPLETE
// =============================================================================

#[tokio::test]
async fn test_forwarded_request_resolves_through_host_message() {
    let mut host = TestHost::new();
    let mut reply = host.bridge.provider().request(send_tx());

    let envelope = host.next_envelope().expect("envelope posted");
    assert_eq!(envelope.method, "eth_sendTransaction");
    assert_eq!(envelope.params, json!([{ "to": BOB, "value": "0x1" }]));
    assert_eq!(envelope.chain_id, "0x1");
    assert!(reply.try_result().is_none());
    assert_eq!(host.bridge.pending_count(), 1);

    let message = json!({ "id": envelope.id, "result": "0xfeed" }).to_string();
    assert_eq!(
        host.bridge.host().dispatch_host_message(&message),
        CompletionOutcome::Resolved
    );

    assert_eq!(reply.await.unwrap(), json!("0xfeed"));
    assert_eq!(host.bridge.pending_count(), 0);
}

#[tokio::test]
async fn test_rejection_message_reaches_page_verbatim() {
    let mut host = TestHost::new();
    let reply = host.bridge.provider().request(send_tx());
    let envelope = host.next_envelope().unwrap();

    let outcome = host
        .bridge
        .host()
        .reject_request(&envelope.id, "User denied transaction signature");
    assert_eq!(outcome, CompletionOutcome::Rejected);

    let err = reply.await.unwrap_err();
    assert_eq!(err.message, "User denied transaction signature");
    assert_eq!(err.code, codes::INTERNAL_ERROR);
}

#[tokio::test]
async fn test_host_error_object_uses_message_field() {
    let mut host = TestHost::new();
    let reply = host.bridge.provider().request(send_tx());
    let envelope = host.next_envelope().unwrap();

    let message = json!({
        "id": envelope.id,
        "error": { "code": 4001, "message": "User rejected the request." }
    })
    .to_string();
    host.bridge.host().dispatch_host_message(&message);

    assert_eq!(reply.await.unwrap_err().message, "User rejected the request.");
}

#[tokio::test]
async fn test_out_of_order_completion() {
    let mut host = TestHost::new();
    let provider = host.bridge.provider().clone();

    let replies: Vec<_> = (0..5)
        .map(|n| provider.request(RequestPayload::new("eth_getBalance").with_params(json!([n]))))
        .collect();
    let envelopes = host.envelopes();
    assert_eq!(envelopes.len(), 5);
    assert_eq!(host.bridge.pending_count(), 5);

    for envelope in envelopes.iter().rev() {
        let n = envelope.params[0].as_u64().unwrap();
        host.bridge
            .host()
            .resolve_request(&envelope.id, HostResult::from(format!("\"0x{:x}\"", n * 100)));
    }

    let results = futures::future::join_all(replies).await;
    for (n, result) in results.into_iter().enumerate() {
        assert_eq!(result.unwrap(), json!(format!("0x{:x}", n * 100)));
    }
    assert_eq!(host.bridge.pending_count(), 0);
}

#[tokio::test]
async fn test_unknown_id_is_a_no_op() {
    let mut host = TestHost::new();
    let mut reply = host.bridge.provider().request(send_tx());
    let envelope = host.next_envelope().unwrap();

    let completion = host.bridge.host();
    assert_eq!(
        completion.resolve_request("not-a-correlation-id", "\"0x1\"".into()),
        CompletionOutcome::UnknownId
    );
    assert_eq!(
        completion.reject_request("0190b5c2-0000-7000-8000-000000000000", "nope"),
        CompletionOutcome::UnknownId
    );

    assert!(reply.try_result().is_none());
    assert_eq!(host.bridge.pending_count(), 1);
    completion.resolve_request(&envelope.id, "true".into());
    assert_eq!(reply.await.unwrap(), json!(true));
}

#[tokio::test]
async fn test_first_completion_wins() {
    let mut host = TestHost::new();
    let reply = host.bridge.provider().request(send_tx());
    let envelope = host.next_envelope().unwrap();

    let completion = host.bridge.host();
    assert_eq!(
        completion.resolve_request(&envelope.id, "\"0xfeed\"".into()),
        CompletionOutcome::Resolved
    );
    assert_eq!(
        completion.reject_request(&envelope.id, "too late"),
        CompletionOutcome::UnknownId
    );
    assert_eq!(
        completion.resolve_request(&envelope.id, "\"0xbeef\"".into()),
        CompletionOutcome::UnknownId
    );

    assert_eq!(reply.await.unwrap(), json!("0xfeed"));
}

#[tokio::test]
async fn test_malformed_result_leaves_request_pending() {
    let mut host = TestHost::new();
    let mut reply = host.bridge.provider().request(send_tx());
    let envelope = host.next_envelope().unwrap();

    let outcome = host
        .bridge
        .host()
        .resolve_request(&envelope.id, HostResult::from("{not json"));
    assert_eq!(outcome, CompletionOutcome::MalformedResult);
    assert!(reply.try_result().is_none());
    assert_eq!(host.bridge.pending_count(), 1);

    host.bridge
        .host()
        .resolve_request(&envelope.id, HostResult::from("{\"ok\":true}"));
    assert_eq!(reply.await.unwrap(), json!({ "ok": true }));
}

#[tokio::test]
async fn test_garbage_host_message_ignored() {
    let mut host = TestHost::new();
    let _reply = host.bridge.provider().request(send_tx());
    let envelope = host.next_envelope().unwrap();

    let completion = host.bridge.host();
    assert_eq!(completion.dispatch_host_message("]]"), CompletionOutcome::Ignored);
    assert_eq!(completion.dispatch_host_message("[1,2]"), CompletionOutcome::Ignored);
    assert_eq!(
        completion.dispatch_host_message(&json!({ "id": envelope.id }).to_string()),
        CompletionOutcome::Ignored
    );
    assert_eq!(host.bridge.pending_count(), 1);
}

#[tokio::test]
async fn test_missing_channel_fails_immediately() {
    let bridge = DappBridge::new(
        BridgeConfig::default(),
        None,
        Arc::new(InMemoryStorage::new()),
    )
    .unwrap();

    let err = bridge.provider().request(send_tx()).await.unwrap_err();
    assert_eq!(err.code, codes::DISCONNECTED);
    assert_eq!(bridge.pending_count(), 0);

    // Local answers are unaffected
    let chain_id = bridge.provider().request(RequestPayload::new("eth_chainId")).await;
    assert_eq!(chain_id.unwrap(), json!("0x1"));
}

#[tokio::test]
async fn test_closed_channel_fails_request() {
    let (channel, inbox) = MpscChannel::unbounded();
    drop(inbox);
    let bridge = DappBridge::new(
        BridgeConfig::default(),
        Some(Arc::new(channel)),
        Arc::new(InMemoryStorage::new()),
    )
    .unwrap();

    let err = bridge.provider().request(send_tx()).await.unwrap_err();
    assert_eq!(err.code, codes::DISCONNECTED);
    assert_eq!(bridge.pending_count(), 0);
}

#[tokio::test]
async fn test_switch_params_forwarded_as_given() {
    let mut host = TestHost::new();
    let reply = host.bridge.provider().request(
        RequestPayload::new("wallet_switchEthereumChain").with_params(json!(["0x89"])),
    );

    let envelope = host.next_envelope().expect("forwarded, not rejected locally");
    assert_eq!(envelope.method, "wallet_switchEthereumChain");
    assert_eq!(envelope.params, json!(["0x89"]));

    host.bridge
        .host()
        .reject_request(&envelope.id, "Invalid chain switch params");
    assert_eq!(
        reply.await.unwrap_err().message,
        "Invalid chain switch params"
    );
}

#[tokio::test]
async fn test_legacy_send_shapes() {
    let mut host = TestHost::new();
    let provider = host.bridge.provider();

    assert_eq!(provider.send("eth_chainId").await.unwrap(), json!("0x1"));

    let reply = provider.send(("personal_sign", json!(["0xdead", ALICE])));
    let envelope = host.next_envelope().unwrap();
    assert_eq!(envelope.method, "personal_sign");
    assert_eq!(envelope.params, json!(["0xdead", ALICE]));
    host.bridge
        .host()
        .resolve_request(&envelope.id, "\"0xsig\"".into());
    assert_eq!(reply.await.unwrap(), json!("0xsig"));
}

// =============================================================================
// HOST CONTROL AND EVENTS
// =============================================================================

#[tokio::test]
async fn test_set_account_announces_and_persists() {
    let mut host = TestHost::new();
    let log = EventLog::attach(&host.bridge);

    host.bridge.controller().set_account(ALICE);

    assert_eq!(
        log.entries(),
        vec![
            (EventName::AccountsChanged, json!([ALICE])),
            (EventName::Connect, json!({ "chainId": "0x1" })),
        ]
    );
    assert_eq!(host.bridge.provider().selected_address().as_deref(), Some(ALICE));
    assert!(host.bridge.provider().is_connected());
    assert_eq!(
        host.storage.get_item(markers::METAMASK_CONNECTED_WALLET).unwrap(),
        Some(ALICE.to_string())
    );
    assert_eq!(host.storage.len(), markers::MARKER_KEYS.len());

    // Same account again: nothing new
    host.bridge.controller().set_account(ALICE);
    assert_eq!(log.entries().len(), 2);
    assert!(host.next_envelope().is_none());
}

#[tokio::test]
async fn test_listeners_fire_once_in_registration_order() {
    let host = TestHost::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    for tag in ["first", "second"] {
        let seen = Arc::clone(&seen);
        host.bridge.provider().on(
            EventName::AccountsChanged,
            listener(move |data| {
                seen.lock().push((tag, data.clone()));
                Ok(())
            }),
        );
    }

    host.bridge.controller().set_account("0x1");
    host.bridge.controller().set_account("0x1");
    host.bridge.run_until_idle();

    assert_eq!(
        *seen.lock(),
        vec![("first", json!(["0x1"])), ("second", json!(["0x1"]))]
    );
}

#[tokio::test]
async fn test_request_accounts_params_reach_host() {
    let mut host = TestHost::new();
    let _reply = host.bridge.provider().request(
        RequestPayload::new("eth_requestAccounts").with_params(json!([{ "force": true }])),
    );

    let envelope = host.next_envelope().unwrap();
    assert_eq!(envelope.method, "eth_requestAccounts");
    assert_eq!(envelope.params, json!([{ "force": true }]));
}

#[tokio::test]
async fn test_request_accounts_round_trip() {
    let mut host = TestHost::new();
    let reply = host.bridge.provider().enable();

    let envelopes = host.envelopes();
    assert_eq!(envelopes.len(), 1);
    assert_eq!(envelopes[0].method, "eth_requestAccounts");
    assert_eq!(envelopes[0].params, json!([]));
    assert!(!envelopes[0].id.is_empty());

    host.bridge
        .host()
        .resolve_request(&envelopes[0].id, HostResult::from(format!("[\"{}\"]", ALICE)));

    assert_eq!(reply.await.unwrap(), json!([ALICE]));
    assert_eq!(host.bridge.pending_count(), 0);
}

#[tokio::test]
async fn test_clear_account_disconnects_and_wipes_markers() {
    let host = TestHost::new();
    host.bridge.controller().set_account(ALICE);
    let log = EventLog::attach(&host.bridge);

    host.bridge.controller().clear_account();

    let entries = log.entries();
    assert_eq!(log.names(), vec![EventName::AccountsChanged, EventName::Disconnect]);
    assert_eq!(entries[0].1, json!([]));
    assert_eq!(entries[1].1["code"], codes::DISCONNECTED);
    assert!(!host.bridge.provider().is_connected());
    assert!(host.storage.is_empty());

    // Nothing selected any more
    host.bridge.controller().clear_account();
    assert_eq!(log.entries().len(), 2);
}

#[tokio::test]
async fn test_account_switch_replaces_selection() {
    let host = TestHost::new();
    host.bridge.controller().set_account(ALICE);
    let log = EventLog::attach(&host.bridge);

    host.bridge.controller().set_account(BOB);

    assert_eq!(log.entries()[0], (EventName::AccountsChanged, json!([BOB])));
    let accounts = host
        .bridge
        .provider()
        .request(RequestPayload::new("eth_accounts"))
        .await;
    assert_eq!(accounts.unwrap(), json!([BOB]));
}

#[tokio::test]
async fn test_storage_failure_does_not_block_events() {
    let bridge = DappBridge::new(
        BridgeConfig::default(),
        None,
        Arc::new(UnavailableStorage::new("private browsing")),
    )
    .unwrap();
    let log = EventLog::attach(&bridge);

    bridge.controller().set_account(ALICE);
    bridge.controller().clear_account();

    assert_eq!(
        log.names(),
        vec![
            EventName::AccountsChanged,
            EventName::Connect,
            EventName::AccountsChanged,
            EventName::Disconnect,
        ]
    );
}

#[tokio::test]
async fn test_markers_disabled_by_config() {
    let config = BridgeConfig::from_toml_str(
        r#"
        [storage]
        persist_connection_markers = false
        "#,
    )
    .unwrap();
    let host = TestHost::with_config(config);

    host.bridge.controller().set_account(ALICE);
    assert!(host.storage.is_empty());
}

#[tokio::test]
async fn test_set_chain_fires_only_on_change() {
    let host = TestHost::new();
    let log = EventLog::attach(&host.bridge);
    let polygon = ChainDescriptor::new(
        "0x89",
        "Polygon",
        "https://polygon-rpc.com",
        "https://polygonscan.com",
    );

    host.bridge.controller().set_chain(polygon.clone());
    host.bridge.controller().set_chain(polygon.clone());
    host.bridge.controller().switch_chain("0x89");

    assert_eq!(log.entries(), vec![(EventName::ChainChanged, json!("0x89"))]);
    assert_eq!(host.bridge.provider().current_chain(), polygon);
}

#[tokio::test]
async fn test_failing_listeners_are_isolated() {
    let host = TestHost::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let provider = host.bridge.provider();

    let record = |seen: &Arc<Mutex<Vec<&'static str>>>, tag: &'static str| {
        let seen = Arc::clone(seen);
        listener(move |_| {
            seen.lock().push(tag);
            Ok(())
        })
    };
    provider.on(EventName::AccountsChanged, record(&seen, "first"));
    provider.on(
        EventName::AccountsChanged,
        listener(|_| Err("listener error".into())),
    );
    provider.on(
        EventName::AccountsChanged,
        listener(|_| panic!("listener panic")),
    );
    provider.on(EventName::AccountsChanged, record(&seen, "last"));

    let report = host
        .bridge
        .controller()
        .trigger_event("accountsChanged", json!([ALICE]));

    assert_eq!(
        report,
        Some(DispatchReport {
            delivered: 2,
            failed: 2
        })
    );
    assert_eq!(*seen.lock(), vec!["first", "last"]);

    // Host state changes still complete after failing listeners
    host.bridge.controller().set_account(ALICE);
    assert_eq!(provider.selected_address().as_deref(), Some(ALICE));
}

#[tokio::test]
async fn test_unknown_event_names_ignored() {
    let host = TestHost::new();
    let calls = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&calls);

    let id = host.bridge.provider().on_named(
        "message",
        listener(move |_| {
            *counter.lock() += 1;
            Ok(())
        }),
    );
    assert!(id.is_none());
    assert!(host
        .bridge
        .controller()
        .trigger_event("message", json!({}))
        .is_none());
    assert_eq!(*calls.lock(), 0);
}

#[tokio::test]
async fn test_listener_may_read_provider_during_dispatch() {
    let host = TestHost::new();
    let provider = host.bridge.provider().clone();
    let observed = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&observed);

    host.bridge.provider().on(
        EventName::Connect,
        listener(move |_| {
            *slot.lock() = Some((provider.selected_address(), provider.chain_id()));
            Ok(())
        }),
    );
    host.bridge.controller().set_account(ALICE);

    assert_eq!(
        *observed.lock(),
        Some((Some(ALICE.to_string()), "0x1".to_string()))
    );
}

// =============================================================================
// DEFERRED WORK
// =============================================================================

#[tokio::test]
async fn test_replay_runs_on_next_turn() {
    let host = TestHost::new();
    host.bridge.controller().set_account(ALICE);
    let seen = Arc::new(Mutex::new(Vec::<Value>::new()));
    let sink = Arc::clone(&seen);

    host.bridge.provider().on(
        EventName::AccountsChanged,
        listener(move |data| {
            sink.lock().push(data.clone());
            Ok(())
        }),
    );

    assert!(seen.lock().is_empty());
    assert_eq!(host.bridge.deferred_count(), 1);

    assert_eq!(host.bridge.run_turn(), 1);
    assert_eq!(*seen.lock(), vec![json!([ALICE])]);
    assert_eq!(host.bridge.deferred_count(), 0);
}

#[tokio::test]
async fn test_replay_follows_chain_switch_before_turn() {
    let host = TestHost::new();
    let seen = Arc::new(Mutex::new(Vec::<Value>::new()));
    let sink = Arc::clone(&seen);

    host.bridge.provider().on(
        EventName::ChainChanged,
        listener(move |data| {
            sink.lock().push(data.clone());
            Ok(())
        }),
    );
    host.bridge.controller().switch_chain("0x89");
    host.bridge.run_until_idle();

    assert_eq!(*seen.lock(), vec![json!("0x89"), json!("0x89")]);
    assert_eq!(seen.lock().last(), Some(&json!(host.bridge.provider().chain_id())));
}

#[tokio::test]
async fn test_no_stale_account_replay_after_clear() {
    let host = TestHost::new();
    host.bridge.controller().set_account(ALICE);
    let seen = Arc::new(Mutex::new(Vec::<Value>::new()));
    let sink = Arc::clone(&seen);

    host.bridge.provider().on(
        EventName::AccountsChanged,
        listener(move |data| {
            sink.lock().push(data.clone());
            Ok(())
        }),
    );
    host.bridge.controller().clear_account();
    host.bridge.run_until_idle();

    assert_eq!(*seen.lock(), vec![json!([])]);
    assert!(!host.bridge.provider().is_connected());
}

#[tokio::test]
async fn test_no_replay_after_removal() {
    let host = TestHost::new();
    let calls = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&calls);
    let provider = host.bridge.provider();

    let id = provider.on(
        EventName::ChainChanged,
        listener(move |_| {
            *counter.lock() += 1;
            Ok(())
        }),
    );
    assert!(provider.remove_listener(EventName::ChainChanged, id));
    host.bridge.run_until_idle();

    assert_eq!(*calls.lock(), 0);
}

#[tokio::test]
async fn test_send_async_callback_waits_for_turn() {
    let mut host = TestHost::new();
    let responses = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&responses);
    host.bridge.provider().send_async(
        RequestPayload::new("eth_chainId").with_id(7),
        move |response| sink.lock().push(response),
    );
    let sink = Arc::clone(&responses);
    host.bridge
        .provider()
        .send_async(send_tx().with_id("tx-1"), move |response| {
            sink.lock().push(response)
        });

    // Fast path answered, callback still waiting
    assert!(responses.lock().is_empty());
    host.bridge.run_turn();
    assert_eq!(
        *responses.lock(),
        vec![Ok(JsonRpcResponse::new(Some(json!(7)), json!("0x1")))]
    );

    let envelope = host.next_envelope().unwrap();
    host.bridge
        .host()
        .reject_request(&envelope.id, "insufficient funds");
    assert_eq!(responses.lock().len(), 1);

    host.bridge.run_turn();
    let responses = responses.lock();
    assert_eq!(responses.len(), 2);
    assert_eq!(
        responses[1],
        Err(ProviderRpcError::host_rejected("insufficient funds"))
    );
}

// =============================================================================
// CHAIN SWITCH AND CONNECT HANDSHAKES
// =============================================================================

#[tokio::test]
async fn test_page_switch_chain_waits_for_host() {
    let mut host = TestHost::new();
    let log = EventLog::attach(&host.bridge);

    let switched = host.bridge.provider().switch_chain("0x89");
    let envelope = host.next_envelope().unwrap();
    assert_eq!(envelope.method, "wallet_switchEthereumChain");
    assert_eq!(envelope.params, json!([{ "chainId": "0x89" }]));
    assert_eq!(host.bridge.provider().chain_id(), "0x1");

    host.bridge
        .host()
        .dispatch_host_message(&json!({ "id": envelope.id, "result": null }).to_string());
    switched.await.unwrap();

    assert_eq!(host.bridge.provider().chain_id(), "0x89");
    assert_eq!(log.entries(), vec![(EventName::ChainChanged, json!("0x89"))]);
}

#[tokio::test]
async fn test_rejected_switch_keeps_chain() {
    let mut host = TestHost::new();
    let log = EventLog::attach(&host.bridge);

    let switched = host.bridge.provider().switch_chain("0x89");
    let envelope = host.next_envelope().unwrap();
    host.bridge
        .host()
        .reject_request(&envelope.id, "Unrecognized chain ID");

    assert_eq!(switched.await.unwrap_err().message, "Unrecognized chain ID");
    assert_eq!(host.bridge.provider().chain_id(), "0x1");
    assert!(log.entries().is_empty());
}

#[tokio::test]
async fn test_connect_through_host() {
    let mut host = TestHost::new();
    let log = EventLog::attach(&host.bridge);

    let connecting = tokio::spawn(host.bridge.provider().connect());
    let envelope = wait_envelope(&mut host).await;
    assert_eq!(envelope.method, "eth_requestAccounts");
    host.bridge
        .host()
        .resolve_request(&envelope.id, HostResult::from(json!([ALICE, BOB])));

    let accounts = connecting.await.unwrap().unwrap();
    assert_eq!(accounts, vec![ALICE.to_string(), BOB.to_string()]);
    assert_eq!(host.bridge.provider().selected_address().as_deref(), Some(ALICE));
    assert_eq!(
        log.entries(),
        vec![
            (EventName::AccountsChanged, json!([ALICE])),
            (EventName::Connect, json!({ "chainId": "0x1" })),
        ]
    );
}

#[tokio::test]
async fn test_connect_with_no_accounts_is_unauthorized() {
    let mut host = TestHost::new();
    let log = EventLog::attach(&host.bridge);

    let connecting = tokio::spawn(host.bridge.provider().connect());
    let envelope = wait_envelope(&mut host).await;
    host.bridge
        .host()
        .resolve_request(&envelope.id, HostResult::from(json!([])));

    let err = connecting.await.unwrap().unwrap_err();
    assert_eq!(err.code, codes::UNAUTHORIZED);
    assert!(!host.bridge.provider().is_connected());
    assert!(log.entries().is_empty());
}

#[tokio::test]
async fn test_auto_connect_with_known_account() {
    let mut host = TestHost::new();
    let log = EventLog::attach(&host.bridge);

    host.bridge.controller().auto_connect("0x89", ALICE).await;

    assert!(host.next_envelope().is_none());
    assert_eq!(host.bridge.provider().chain_id(), "0x89");
    assert_eq!(
        log.names(),
        vec![
            EventName::AccountsChanged,
            EventName::Connect,
            EventName::Connect,
            EventName::AccountsChanged,
        ]
    );
    assert_eq!(log.entries()[3].1, json!([ALICE]));
}

#[tokio::test]
async fn test_auto_connect_round_trips_when_account_unknown() {
    let mut host = TestHost::new();
    let log = EventLog::attach(&host.bridge);

    let connecting = tokio::spawn(host.bridge.controller().auto_connect("0x1", ""));

    let permissions = wait_envelope(&mut host).await;
    assert_eq!(permissions.method, "wallet_requestPermissions");
    assert_eq!(permissions.params, json!([{ "eth_accounts": {} }]));
    host.bridge.host().resolve_request(
        &permissions.id,
        HostResult::from(json!([{ "parentCapability": "eth_accounts" }])),
    );

    let accounts = wait_envelope(&mut host).await;
    assert_eq!(accounts.method, "eth_requestAccounts");
    host.bridge
        .host()
        .resolve_request(&accounts.id, HostResult::from(json!([BOB])));

    connecting.await.unwrap();
    assert_eq!(host.bridge.provider().selected_address().as_deref(), Some(BOB));
    assert_eq!(log.names().first(), Some(&EventName::AccountsChanged));
    assert_eq!(log.names().len(), 4);
    assert!(host.next_envelope().is_none());
}

#[tokio::test]
async fn test_auto_connect_stops_on_denied_permissions() {
    let mut host = TestHost::new();
    let log = EventLog::attach(&host.bridge);

    let connecting = tokio::spawn(host.bridge.controller().auto_connect("0x1", ""));
    let permissions = wait_envelope(&mut host).await;
    host.bridge
        .host()
        .reject_request(&permissions.id, "User rejected the request.");

    connecting.await.unwrap();
    assert!(log.entries().is_empty());
    assert!(host.next_envelope().is_none());
}
