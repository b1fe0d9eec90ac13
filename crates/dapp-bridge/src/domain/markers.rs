//! Durable connection markers.
//!
//! Page libraries (MetaMask detectors, WalletConnect, web3modal) check local
//! storage to decide whether a wallet session already exists. The markers are
//! written when an account is selected and removed when it is cleared. They
//! are advisory only; nothing in the bridge reads them back.

use serde_json::json;

pub const METAMASK_IS_CONNECTED: &str = "metamask-is-connected";
pub const METAMASK_IS_UNLOCKED: &str = "metamask-is-unlocked";
pub const METAMASK_CONNECTED_WALLET: &str = "metamask-connected-wallet";
pub const WALLETCONNECT: &str = "walletconnect";
pub const WEB3_CONNECT_CACHED_PROVIDER: &str = "WEB3_CONNECT_CACHED_PROVIDER";
pub const WALLET_CONNECTED: &str = "WALLET_CONNECTED";

/// Every marker key, in write order.
pub const MARKER_KEYS: [&str; 6] = [
    METAMASK_IS_CONNECTED,
    METAMASK_IS_UNLOCKED,
    METAMASK_CONNECTED_WALLET,
    WALLETCONNECT,
    WEB3_CONNECT_CACHED_PROVIDER,
    WALLET_CONNECTED,
];

/// Key/value pairs to persist for `address`.
pub fn connection_markers(address: &str) -> Vec<(&'static str, String)> {
    vec![
        (METAMASK_IS_CONNECTED, "true".to_string()),
        (METAMASK_IS_UNLOCKED, "true".to_string()),
        (METAMASK_CONNECTED_WALLET, address.to_string()),
        (
            WALLETCONNECT,
            json!({ "connected": true, "accounts": [address] }).to_string(),
        ),
        (WEB3_CONNECT_CACHED_PROVIDER, json!("injected").to_string()),
        (WALLET_CONNECTED, "true".to_string()),
    ]
}
