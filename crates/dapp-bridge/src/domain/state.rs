//! Provider state: active chain, selected account, connection status.

use crate::domain::chain::{network_version, ChainDescriptor};
use serde::Serialize;

/// Mutable provider state.
///
/// `connected` is derived from `selected_address`, so the two can never
/// disagree.
#[derive(Debug, Clone)]
pub struct ProviderState {
    /// Chain id reported to the page
    chain_id: String,
    /// Descriptor of the last chain the host pushed
    current_chain: ChainDescriptor,
    /// Account exposed to the page
    selected_address: Option<String>,
}

impl ProviderState {
    pub fn new(chain: ChainDescriptor) -> Self {
        Self {
            chain_id: chain.chain_id.clone(),
            current_chain: chain,
            selected_address: None,
        }
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn network_version(&self) -> String {
        network_version(&self.chain_id)
    }

    pub fn current_chain(&self) -> &ChainDescriptor {
        &self.current_chain
    }

    pub fn selected_address(&self) -> Option<&str> {
        self.selected_address.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.selected_address.is_some()
    }

    /// Set the reported chain id. Returns `true` if it changed.
    pub fn set_chain_id(&mut self, chain_id: &str) -> bool {
        if self.chain_id == chain_id {
            return false;
        }
        self.chain_id = chain_id.to_string();
        true
    }

    /// Replace the chain descriptor and sync the reported id.
    /// Returns `true` if the chain id changed.
    pub fn replace_chain(&mut self, chain: ChainDescriptor) -> bool {
        let changed = self.set_chain_id(&chain.chain_id);
        self.current_chain = chain;
        changed
    }

    /// Select an account. Returns `true` if the selection changed.
    pub fn select_address(&mut self, address: &str) -> bool {
        if self.selected_address.as_deref() == Some(address) {
            return false;
        }
        self.selected_address = Some(address.to_string());
        true
    }

    /// Drop the selected account. Returns the previous one.
    pub fn clear_address(&mut self) -> Option<String> {
        self.selected_address.take()
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            chain_id: self.chain_id.clone(),
            network_version: self.network_version(),
            selected_address: self.selected_address.clone(),
            connected: self.is_connected(),
        }
    }
}

/// Read-only copy of the provider state, as the page would see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub chain_id: String,
    pub network_version: String,
    pub selected_address: Option<String>,
    pub connected: bool,
}
