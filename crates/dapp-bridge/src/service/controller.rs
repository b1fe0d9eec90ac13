//! Controller facade: host-driven state changes.
//!
//! The host pushes chain and account changes here. Each change updates the
//! provider state first and then fans out to page listeners.

use crate::domain::chain::ChainDescriptor;
use crate::domain::error::ProviderRpcError;
use crate::domain::events::{DispatchReport, EventName, ProviderEvent};
use crate::domain::methods::ProviderRequest;
use crate::ports::inbound::{ConnectFuture, HostControl};
use crate::service::context::BridgeCore;
use crate::service::provider::Provider;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Host-facing controller.
#[derive(Clone)]
pub struct Controller {
    core: Arc<BridgeCore>,
    provider: Provider,
}

impl Controller {
    pub(crate) fn new(provider: Provider) -> Self {
        Self {
            core: Arc::clone(provider.core()),
            provider,
        }
    }
}

impl HostControl for Controller {
    fn set_chain(&self, chain: ChainDescriptor) {
        let chain_id = chain.chain_id.clone();
        let changed = self.core.state.write().replace_chain(chain);
        if !changed {
            debug!(chain_id = %chain_id, "Chain unchanged");
            return;
        }
        info!(chain_id = %chain_id, "Chain set by host");
        self.core.emit(ProviderEvent::ChainChanged(chain_id));
    }

    fn switch_chain(&self, chain_id: &str) {
        if !self.core.state.write().set_chain_id(chain_id) {
            debug!(chain_id = chain_id, "Chain unchanged");
            return;
        }
        info!(chain_id = chain_id, "Chain switched by host");
        self.core.emit(ProviderEvent::ChainChanged(chain_id.to_string()));
    }

    fn set_account(&self, address: &str) {
        if address.is_empty() {
            return;
        }
        if !self.core.state.write().select_address(address) {
            debug!(address = address, "Account unchanged");
            return;
        }
        info!(address = address, "Account set by host");

        self.core.persist_markers(address);
        let chain_id = self.provider.chain_id();
        self.core
            .emit(ProviderEvent::AccountsChanged(vec![address.to_string()]));
        self.core.emit(ProviderEvent::Connect { chain_id });
    }

    fn clear_account(&self) {
        let Some(previous) = self.core.state.write().clear_address() else {
            debug!("No account selected");
            return;
        };
        info!(address = %previous, "Account cleared by host");

        self.core.clear_markers();
        self.core.emit(ProviderEvent::AccountsChanged(Vec::new()));
        self.core
            .emit(ProviderEvent::Disconnect(ProviderRpcError::disconnected()));
    }

    fn auto_connect(&self, chain_id: &str, address: &str) -> ConnectFuture {
        info!(chain_id = chain_id, address = address, "Starting auto-connect");
        {
            let mut state = self.core.state.write();
            state.set_chain_id(chain_id);
            if !address.is_empty() {
                state.select_address(address);
            }
        }

        let permissions = self
            .provider
            .dispatch(ProviderRequest::WalletRequestPermissions {
                params: json!([{ "eth_accounts": {} }]),
            });
        let provider = self.provider.clone();

        Box::pin(async move {
            match permissions.await {
                Ok(granted) => debug!(permissions = %granted, "Permission request succeeded"),
                Err(e) => {
                    warn!(error = %e, "Permission request failed");
                    return;
                }
            }

            if let Err(e) = provider.connect().await {
                warn!(error = %e, "Connect during auto-connect failed");
            }

            match provider.dispatch(ProviderRequest::request_accounts()).await {
                Ok(accounts) => {
                    let core = provider.core();
                    let chain_id = core.state.read().chain_id().to_string();
                    core.emit(ProviderEvent::Connect { chain_id });
                    core.events.trigger(EventName::AccountsChanged, &accounts);
                    info!("Auto-connect finished");
                }
                Err(e) => warn!(error = %e, "Account request failed"),
            }
        })
    }

    fn trigger_event(&self, name: &str, data: Value) -> Option<DispatchReport> {
        match name.parse::<EventName>() {
            Ok(event) => Some(self.core.events.trigger(event, &data)),
            Err(e) => {
                debug!(error = %e, "Ignoring trigger for unsupported event");
                None
            }
        }
    }
}
