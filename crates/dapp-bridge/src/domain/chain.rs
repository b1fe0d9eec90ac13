//! Chain descriptors.
//!
//! A descriptor is never mutated in place: switching chains replaces it
//! wholesale. Chain ids are carried as hex strings exactly as the host sends
//! them; no semantic validation happens here.

use serde::{Deserialize, Serialize};

/// Chain id of Ethereum mainnet, the default chain.
pub const MAINNET_CHAIN_ID: &str = "0x1";

/// Network parameters for the chain the provider reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDescriptor {
    /// Hex chain id (e.g. `0x1`). Identity key.
    pub chain_id: String,
    /// Human readable chain name
    pub chain_name: String,
    /// RPC endpoint
    pub rpc_url: String,
    /// Block explorer base URL
    pub block_explorer_url: String,
}

impl ChainDescriptor {
    pub fn new(
        chain_id: impl Into<String>,
        chain_name: impl Into<String>,
        rpc_url: impl Into<String>,
        block_explorer_url: impl Into<String>,
    ) -> Self {
        Self {
            chain_id: chain_id.into(),
            chain_name: chain_name.into(),
            rpc_url: rpc_url.into(),
            block_explorer_url: block_explorer_url.into(),
        }
    }

    /// Ethereum mainnet.
    pub fn mainnet() -> Self {
        Self::new(
            MAINNET_CHAIN_ID,
            "Ethereum Mainnet",
            "https://mainnet.infura.io/v3/your-project-id",
            "https://etherscan.io",
        )
    }

    /// Same chain as `other` (compares ids only).
    pub fn same_chain(&self, other: &ChainDescriptor) -> bool {
        self.chain_id == other.chain_id
    }
}

impl Default for ChainDescriptor {
    fn default() -> Self {
        Self::mainnet()
    }
}

/// Legacy `net_version` form of a chain id: the id with its `0x` prefix
/// stripped.
pub fn network_version(chain_id: &str) -> String {
    chain_id.replacen("0x", "", 1)
}
