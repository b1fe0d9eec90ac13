//! # Inbound Ports
//!
//! Entry points the native host calls into.
//!
//! | Port | Implemented by | Purpose |
//! |------|----------------|---------|
//! | `HostCompletion` | `HostBridge` | complete forwarded requests |
//! | `HostControl` | `Controller` | push chain/account changes and events |
//!
//! None of these return errors: failures are logged and contained inside the
//! bridge.

use crate::domain::chain::ChainDescriptor;
use crate::domain::events::DispatchReport;
use crate::domain::pending::{CompletionOutcome, HostResult};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;

/// Remaining work of an auto-connect sequence.
pub type ConnectFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Host-side completion of forwarded requests.
pub trait HostCompletion: Send + Sync {
    /// Complete a pending request with a result.
    ///
    /// Unknown ids are a no-op. A `HostResult::Text` that is not valid JSON
    /// leaves the request pending.
    fn resolve_request(&self, id: &str, result: HostResult) -> CompletionOutcome;

    /// Fail a pending request. `message` reaches the page caller verbatim.
    fn reject_request(&self, id: &str, message: &str) -> CompletionOutcome;

    /// Text form of the two calls above: `{"id","result"}` or `{"id","error"}`.
    fn dispatch_host_message(&self, text: &str) -> CompletionOutcome;
}

/// Host-side control of provider state.
pub trait HostControl: Send + Sync {
    /// Replace the chain descriptor; fires `chainChanged` if the id changed.
    fn set_chain(&self, chain: ChainDescriptor);

    /// Change only the chain id; fires `chainChanged` if it changed.
    fn switch_chain(&self, chain_id: &str);

    /// Select an account; fires `accountsChanged` then `connect`.
    fn set_account(&self, address: &str);

    /// Drop the selected account; fires `accountsChanged([])` then
    /// `disconnect`.
    fn clear_account(&self);

    /// Set chain and account without events, then run the connect handshake.
    fn auto_connect(&self, chain_id: &str, address: &str) -> ConnectFuture;

    /// Fire `name` with `data`. Unknown names are ignored (`None`).
    fn trigger_event(&self, name: &str, data: Value) -> Option<DispatchReport>;
}
