//! Provider facade.
//!
//! The EIP-1193 surface page code talks to. Requests the bridge can answer
//! from its own state complete before `request()` returns; everything else is
//! forwarded to the host and completes when the host answers.

use crate::domain::chain::ChainDescriptor;
use crate::domain::config::ProviderFlags;
use crate::domain::error::{codes, ProviderRpcError};
use crate::domain::events::{invoke_listener, EventName, Listener, ListenerId, ProviderEvent};
use crate::domain::methods::{JsonRpcResponse, Permission, ProviderRequest, RequestPayload};
use crate::domain::pending::Responder;
use crate::domain::state::{ProviderState, StateSnapshot};
use crate::service::context::BridgeCore;
use serde_json::{json, Value};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tracing::{debug, warn};

type Reply = Result<Value, ProviderRpcError>;

/// Eventual result of a provider request.
///
/// Fast-path replies are complete on creation. Forwarded replies complete
/// when the host resolves or rejects the request; there is no timeout.
#[derive(Debug)]
pub struct ReplyFuture {
    rx: oneshot::Receiver<Reply>,
}

impl ReplyFuture {
    fn channel() -> (Responder, Self) {
        let (tx, rx) = oneshot::channel();
        let responder: Responder = Box::new(move |result| {
            // Receiver dropped: the page stopped waiting.
            let _ = tx.send(result);
        });
        (responder, Self { rx })
    }

    /// Take the result if it is already there, without waiting.
    ///
    /// Returns `None` while the request is outstanding. Once a result has
    /// been taken the future is spent; later calls report `bridge_closed`.
    pub fn try_result(&mut self) -> Option<Reply> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => {
                Some(Err(ProviderRpcError::bridge_closed()))
            }
        }
    }
}

impl Future for ReplyFuture {
    type Output = Reply;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| Err(ProviderRpcError::bridge_closed())))
    }
}

/// Argument of the legacy `send()` shim.
#[derive(Debug, Clone, PartialEq)]
pub enum LegacyCall {
    /// `send("eth_accounts", params)`
    Method {
        method: String,
        params: Option<Value>,
    },
    /// `send({method, params, id})`
    Payload(RequestPayload),
}

impl LegacyCall {
    fn into_payload(self) -> RequestPayload {
        match self {
            LegacyCall::Method { method, params } => RequestPayload {
                method,
                params,
                id: None,
            },
            LegacyCall::Payload(payload) => payload,
        }
    }
}

impl From<&str> for LegacyCall {
    fn from(method: &str) -> Self {
        LegacyCall::Method {
            method: method.to_string(),
            params: None,
        }
    }
}

impl From<(&str, Value)> for LegacyCall {
    fn from((method, params): (&str, Value)) -> Self {
        LegacyCall::Method {
            method: method.to_string(),
            params: Some(params),
        }
    }
}

impl From<RequestPayload> for LegacyCall {
    fn from(payload: RequestPayload) -> Self {
        LegacyCall::Payload(payload)
    }
}

/// Page-facing provider object.
#[derive(Clone)]
pub struct Provider {
    core: Arc<BridgeCore>,
}

impl Provider {
    pub(crate) fn new(core: Arc<BridgeCore>) -> Self {
        Self { core }
    }

    pub(crate) fn core(&self) -> &Arc<BridgeCore> {
        &self.core
    }

    /// `ethereum.request({method, params})`
    pub fn request(&self, payload: RequestPayload) -> ReplyFuture {
        let (responder, reply) = ReplyFuture::channel();
        self.submit_payload(payload, responder);
        reply
    }

    /// Typed form of [`Provider::request`].
    pub fn dispatch(&self, request: ProviderRequest) -> ReplyFuture {
        let (responder, reply) = ReplyFuture::channel();
        self.submit(request, responder);
        reply
    }

    /// `ethereum.enable()`, same as requesting accounts.
    pub fn enable(&self) -> ReplyFuture {
        self.dispatch(ProviderRequest::request_accounts())
    }

    /// Register a listener.
    ///
    /// When the provider already has something to report, the listener gets a
    /// replay on the next turn: `accountsChanged` and `connect` when an account
    /// is selected, `chainChanged` always. The replay carries the state as of
    /// that turn, and is dropped if the account was cleared in between or the
    /// listener was removed.
    pub fn on(&self, event: EventName, listener: Listener) -> ListenerId {
        let wants_replay = replay_payload(&self.core.state.read(), event).is_some();
        let id = self.core.events.add(event, Arc::clone(&listener));

        if wants_replay {
            let core = Arc::downgrade(&self.core);
            self.core.turns.defer("listener_replay", move || {
                let Some(core) = core.upgrade() else {
                    return;
                };
                if !core.events.contains(event, id) {
                    debug!(event = %event, listener = %id, "Listener removed before replay");
                    return;
                }
                let replay = {
                    let state = core.state.read();
                    replay_payload(&state, event)
                };
                let Some(data) = replay else {
                    debug!(event = %event, listener = %id, "Nothing left to replay");
                    return;
                };
                if let Err(e) = invoke_listener(event, &listener, &data) {
                    warn!(event = %event, listener = %id, error = %e, "Listener replay failed");
                }
            });
        }
        id
    }

    /// [`Provider::on`] by event name. Unknown names register nothing.
    pub fn on_named(&self, name: &str, listener: Listener) -> Option<ListenerId> {
        match name.parse::<EventName>() {
            Ok(event) => Some(self.on(event, listener)),
            Err(e) => {
                debug!(error = %e, "Ignoring listener for unsupported event");
                None
            }
        }
    }

    pub fn remove_listener(&self, event: EventName, id: ListenerId) -> bool {
        self.core.events.remove(event, id)
    }

    /// Remove every registration of `listener` for `event`.
    pub fn remove_callback(&self, event: EventName, listener: &Listener) -> usize {
        self.core.events.remove_callback(event, listener)
    }

    /// Legacy `send(method, params)` / `send(payload)`.
    pub fn send(&self, call: impl Into<LegacyCall>) -> ReplyFuture {
        self.request(call.into().into_payload())
    }

    /// Legacy `sendAsync(payload, callback)`.
    ///
    /// The callback always runs on a later turn, even for fast-path answers.
    pub fn send_async<F>(&self, payload: RequestPayload, callback: F)
    where
        F: FnOnce(Result<JsonRpcResponse, ProviderRpcError>) + Send + 'static,
    {
        let rpc_id = payload.id.clone();
        let core = Arc::downgrade(&self.core);
        let responder: Responder = Box::new(move |result| {
            let Some(core) = core.upgrade() else {
                debug!("Bridge dropped before sendAsync callback");
                return;
            };
            core.turns.defer("send_async", move || {
                callback(result.map(|value| JsonRpcResponse::new(rpc_id, value)))
            });
        });
        self.submit_payload(payload, responder);
    }

    pub fn is_connected(&self) -> bool {
        self.core.state.read().is_connected()
    }

    pub fn chain_id(&self) -> String {
        self.core.state.read().chain_id().to_string()
    }

    pub fn network_version(&self) -> String {
        self.core.state.read().network_version()
    }

    pub fn selected_address(&self) -> Option<String> {
        self.core.state.read().selected_address().map(str::to_string)
    }

    pub fn current_chain(&self) -> ChainDescriptor {
        self.core.state.read().current_chain().clone()
    }

    pub fn flags(&self) -> &ProviderFlags {
        &self.core.config.provider
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.core.state.read().snapshot()
    }

    /// Ask the host to switch chains. State changes and `chainChanged` fires
    /// only once the host confirms.
    pub fn switch_chain(
        &self,
        chain_id: &str,
    ) -> impl Future<Output = Result<(), ProviderRpcError>> + Send + 'static {
        let reply = self.dispatch(ProviderRequest::switch_chain(chain_id));
        let core = Arc::clone(&self.core);
        let chain_id = chain_id.to_string();
        async move {
            reply.await?;
            core.state.write().set_chain_id(&chain_id);
            core.emit(ProviderEvent::ChainChanged(chain_id));
            Ok(())
        }
    }

    /// Request accounts, select the first one and announce it with
    /// `accountsChanged` then `connect`.
    pub fn connect(
        &self,
    ) -> impl Future<Output = Result<Vec<String>, ProviderRpcError>> + Send + 'static {
        let reply = self.dispatch(ProviderRequest::request_accounts());
        let core = Arc::clone(&self.core);
        async move {
            let accounts: Vec<String> = serde_json::from_value(reply.await?).map_err(|e| {
                ProviderRpcError::internal(format!("unexpected accounts result: {}", e))
            })?;
            let Some(first) = accounts.first().cloned() else {
                return Err(ProviderRpcError::new(
                    codes::UNAUTHORIZED,
                    "host returned no accounts",
                ));
            };

            core.state.write().select_address(&first);
            let chain_id = core.state.read().chain_id().to_string();
            core.emit(ProviderEvent::AccountsChanged(vec![first]));
            core.emit(ProviderEvent::Connect { chain_id });
            Ok(accounts)
        }
    }

    fn submit_payload(&self, payload: RequestPayload, responder: Responder) {
        self.submit(ProviderRequest::from_payload(payload), responder);
    }

    fn submit(&self, request: ProviderRequest, responder: Responder) {
        match self.fast_path(&request) {
            Some(value) => {
                debug!(method = request.method(), "Answered from provider state");
                responder(Ok(value));
            }
            None => self.core.forward(&request, responder),
        }
    }

    fn fast_path(&self, request: &ProviderRequest) -> Option<Value> {
        let state = self.core.state.read();
        match request {
            ProviderRequest::EthAccounts { .. } | ProviderRequest::EthRequestAccounts { .. } => {
                state.selected_address().map(|address| json!([address]))
            }
            ProviderRequest::WalletRequestPermissions { .. } => state
                .selected_address()
                .map(|address| json!([Permission::eth_accounts(address)])),
            ProviderRequest::EthChainId { .. } => Some(json!(state.chain_id())),
            ProviderRequest::NetVersion { .. } => Some(json!(state.network_version())),
            _ => None,
        }
    }
}

/// What a freshly registered listener should be told about `state`.
fn replay_payload(state: &ProviderState, event: EventName) -> Option<Value> {
    match event {
        EventName::AccountsChanged => state.selected_address().map(|a| json!([a])),
        EventName::Connect => state
            .selected_address()
            .map(|_| json!({ "chainId": state.chain_id() })),
        EventName::ChainChanged => Some(json!(state.chain_id())),
        EventName::Disconnect | EventName::RequestError => None,
    }
}
