//! Shared bridge state.
//!
//! One `BridgeCore` per page context. The facades (`Provider`, `Controller`,
//! `HostBridge`) hold an `Arc` to it. Locks are held only for the duration of
//! a read or a state transition, never while page callbacks run.

use crate::adapters::host_bridge::HostEnvelope;
use crate::domain::config::BridgeConfig;
use crate::domain::error::{BridgeError, ProviderRpcError};
use crate::domain::events::{DispatchReport, EventRegistry, ProviderEvent};
use crate::domain::markers::{connection_markers, MARKER_KEYS};
use crate::domain::methods::ProviderRequest;
use crate::domain::pending::{PendingRequestTable, Responder};
use crate::domain::state::ProviderState;
use crate::domain::turns::TurnQueue;
use crate::ports::outbound::{DurableStorage, HostChannel};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

pub(crate) struct BridgeCore {
    pub(crate) config: BridgeConfig,
    pub(crate) state: RwLock<ProviderState>,
    pub(crate) events: EventRegistry,
    pub(crate) pending: PendingRequestTable,
    pub(crate) turns: TurnQueue,
    channel: Option<Arc<dyn HostChannel>>,
    storage: Arc<dyn DurableStorage>,
}

impl BridgeCore {
    pub(crate) fn new(
        config: BridgeConfig,
        channel: Option<Arc<dyn HostChannel>>,
        storage: Arc<dyn DurableStorage>,
    ) -> Self {
        let state = ProviderState::new(config.default_chain.clone());
        Self {
            config,
            state: RwLock::new(state),
            events: EventRegistry::new(),
            pending: PendingRequestTable::new(),
            turns: TurnQueue::new(),
            channel,
            storage,
        }
    }

    /// Send `request` to the host. `responder` runs exactly once: on host
    /// completion, or right away if the request could not be sent.
    pub(crate) fn forward(&self, request: &ProviderRequest, responder: Responder) {
        let method = request.method();
        let Some(channel) = self.channel.as_ref() else {
            warn!(method = method, "Host channel unavailable, rejecting request");
            responder(Err(BridgeError::ChannelUnavailable.into()));
            return;
        };

        let id = self.pending.register(method, responder);
        let envelope = HostEnvelope {
            id: id.to_string(),
            method: method.to_string(),
            params: request.params().clone(),
            chain_id: self.state.read().chain_id().to_string(),
        };

        let sent = envelope
            .encode()
            .and_then(|text| channel.post_message(&text).map_err(BridgeError::from));
        match sent {
            Ok(()) => debug!(correlation_id = %id, method = method, "Forwarded request to host"),
            Err(e) => {
                warn!(correlation_id = %id, method = method, error = %e, "Failed to forward request");
                self.pending.fail(&id, ProviderRpcError::from(e));
            }
        }
    }

    pub(crate) fn emit(&self, event: ProviderEvent) -> DispatchReport {
        debug!(event = %event.name(), "Emitting provider event");
        self.events.emit(&event)
    }

    /// Write the connection markers for `address`. Failures are logged only.
    pub(crate) fn persist_markers(&self, address: &str) {
        if !self.config.storage.persist_connection_markers {
            return;
        }
        let mut failed = 0;
        for (key, value) in connection_markers(address) {
            if let Err(e) = self.storage.set_item(key, &value) {
                let err = BridgeError::StorageUnavailable(e);
                warn!(key = key, error = %err, "Failed to write connection marker");
                failed += 1;
            }
        }
        debug!(failed = failed, "Connection markers written");
    }

    /// Remove every connection marker. Failures are logged only.
    pub(crate) fn clear_markers(&self) {
        if !self.config.storage.persist_connection_markers {
            return;
        }
        for key in MARKER_KEYS {
            if let Err(e) = self.storage.remove_item(key) {
                let err = BridgeError::StorageUnavailable(e);
                warn!(key = key, error = %err, "Failed to remove connection marker");
            }
        }
    }
}
