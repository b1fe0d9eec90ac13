// Allow missing docs for internal items in development
#![allow(missing_docs)]

//! DApp Bridge - in-page wallet provider backed by a native host.
//!
//! Page code sees an EIP-1193 provider. Everything that needs keys, accounts
//! or network access is forwarded to the native host over a one-way text
//! channel and completed later by id.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────── page ─────────────────────────────┐
//! │   request() / on() / send() / sendAsync()                      │
//! │          │                                                     │
//! │  ┌───────┴────────┐   fast paths   ┌────────────────┐          │
//! │  │    Provider    │───────────────▶│ ProviderState  │          │
//! │  └───────┬────────┘                └───────▲────────┘          │
//! │          │ forward                         │                   │
//! │  ┌───────┴────────┐                ┌───────┴────────┐          │
//! │  │ PendingRequest │                │   Controller   │──▶ EventRegistry
//! │  │     Table      │                └───────▲────────┘          │
//! │  └───▲───────┬────┘                        │                   │
//! └──────┼───────┼─────────────────────────────┼───────────────────┘
//!        │       │ HostChannel::post_message   │ set_chain / set_account
//!  resolve/reject▼                             │
//!  ┌─────────────────────────── native host ───┴───────────────────┐
//!  └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use dapp_bridge::{BridgeConfig, DappBridge, HostCompletion, HostControl, RequestPayload};
//!
//! let bridge = DappBridge::new(BridgeConfig::default(), Some(channel), storage)?;
//! let reply = bridge.provider().request(RequestPayload::new("eth_requestAccounts"));
//!
//! // later, from the host:
//! bridge.host().resolve_request(&id, r#"["0xabc"]"#.into());
//! bridge.controller().set_account("0xabc");
//! bridge.run_turn();
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports for public API
pub use adapters::{HostBridge, HostEnvelope, InMemoryStorage, MpscChannel, UnavailableStorage};
pub use domain::config::{BridgeConfig, ConfigError, ProviderFlags, StorageConfig};
pub use domain::error::{codes, BridgeError, ProviderRpcError};
pub use domain::events::{listener, DispatchReport, EventName, Listener, ListenerError, ListenerId};
pub use domain::methods::{JsonRpcResponse, ProviderRequest, RequestPayload};
pub use domain::pending::{CompletionOutcome, HostResult};
pub use domain::state::StateSnapshot;
pub use domain::ChainDescriptor;
pub use ports::{ChannelError, DurableStorage, HostChannel, HostCompletion, HostControl, StorageError};
pub use service::{Controller, LegacyCall, Provider, ReplyFuture};

use service::context::BridgeCore;
use std::sync::Arc;
use tracing::info;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Upper bound on turns run by [`DappBridge::run_until_idle`].
pub const MAX_IDLE_TURNS: usize = 64;

/// One bridge per page context.
///
/// Owns the provider state, listener registry, correlation table and turn
/// queue. The facades it hands out are cheap clones sharing that state.
pub struct DappBridge {
    core: Arc<BridgeCore>,
    provider: Provider,
    controller: Controller,
    host: HostBridge,
}

impl DappBridge {
    /// Build a bridge. `channel` is `None` when the host never installed its
    /// message handler; forwarded requests then fail immediately.
    pub fn new(
        config: BridgeConfig,
        channel: Option<Arc<dyn HostChannel>>,
        storage: Arc<dyn DurableStorage>,
    ) -> Result<Self, BridgeError> {
        config.validate()?;

        let has_channel = channel.is_some();
        let core = Arc::new(BridgeCore::new(config, channel, storage));
        let provider = Provider::new(Arc::clone(&core));
        let controller = Controller::new(provider.clone());
        let host = HostBridge::new(Arc::clone(&core));

        info!(
            chain_id = %provider.chain_id(),
            host_channel = has_channel,
            version = VERSION,
            "Provider bridge initialised"
        );

        Ok(Self {
            core,
            provider,
            controller,
            host,
        })
    }

    /// Page-facing provider.
    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    /// Host-facing state control.
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Host-facing completion entry points.
    pub fn host(&self) -> &HostBridge {
        &self.host
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.core.config
    }

    /// Run deferred work queued before this call (listener replays,
    /// `send_async` callbacks). Returns how many tasks ran.
    pub fn run_turn(&self) -> usize {
        self.core.turns.run_turn()
    }

    /// Run turns until the queue drains, up to [`MAX_IDLE_TURNS`].
    pub fn run_until_idle(&self) -> usize {
        self.core.turns.run_until_idle(MAX_IDLE_TURNS)
    }

    /// Tasks waiting for the next turn.
    pub fn deferred_count(&self) -> usize {
        self.core.turns.len()
    }

    /// Forwarded requests not yet completed by the host.
    pub fn pending_count(&self) -> usize {
        self.core.pending.pending_count()
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.provider.snapshot()
    }
}
