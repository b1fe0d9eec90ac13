//! Provider request methods.
//!
//! Page payloads arrive as `{method, params}`. They are lifted into
//! [`ProviderRequest`], a closed set of methods the bridge knows about plus an
//! explicit `Unsupported` variant that is forwarded to the host untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub(crate) const ETH_ACCOUNTS: &str = "eth_accounts";
pub(crate) const ETH_REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
pub(crate) const ETH_CHAIN_ID: &str = "eth_chainId";
pub(crate) const NET_VERSION: &str = "net_version";
pub(crate) const WALLET_REQUEST_PERMISSIONS: &str = "wallet_requestPermissions";
pub(crate) const WALLET_SWITCH_ETHEREUM_CHAIN: &str = "wallet_switchEthereumChain";

/// Raw request payload as page code builds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestPayload {
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Legacy JSON-RPC id, echoed back by `send_async`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

impl RequestPayload {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            params: None,
            id: None,
        }
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_id(mut self, id: impl Into<Value>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Typed provider request.
///
/// Every variant keeps the params exactly as the page passed them (`[]` when
/// absent); they go out in the host envelope unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderRequest {
    EthAccounts { params: Value },
    EthRequestAccounts { params: Value },
    EthChainId { params: Value },
    NetVersion { params: Value },
    WalletRequestPermissions { params: Value },
    WalletSwitchEthereumChain { params: Value },
    /// Any method the bridge has no special handling for.
    Unsupported { method: String, params: Value },
}

impl ProviderRequest {
    /// Lift a raw payload. Never fails: params are not inspected here.
    pub fn from_payload(payload: RequestPayload) -> Self {
        let params = payload.params.unwrap_or_else(no_params);
        match payload.method.as_str() {
            ETH_ACCOUNTS => Self::EthAccounts { params },
            ETH_REQUEST_ACCOUNTS => Self::EthRequestAccounts { params },
            ETH_CHAIN_ID => Self::EthChainId { params },
            NET_VERSION => Self::NetVersion { params },
            WALLET_REQUEST_PERMISSIONS => Self::WalletRequestPermissions { params },
            WALLET_SWITCH_ETHEREUM_CHAIN => Self::WalletSwitchEthereumChain { params },
            other => Self::Unsupported {
                method: other.to_string(),
                params,
            },
        }
    }

    /// `eth_requestAccounts` with no params.
    pub fn request_accounts() -> Self {
        Self::EthRequestAccounts {
            params: no_params(),
        }
    }

    /// `wallet_switchEthereumChain` with `[{chainId}]`.
    pub fn switch_chain(chain_id: impl Into<String>) -> Self {
        Self::WalletSwitchEthereumChain {
            params: serde_json::json!([{ "chainId": chain_id.into() }]),
        }
    }

    pub fn method(&self) -> &str {
        match self {
            Self::EthAccounts { .. } => ETH_ACCOUNTS,
            Self::EthRequestAccounts { .. } => ETH_REQUEST_ACCOUNTS,
            Self::EthChainId { .. } => ETH_CHAIN_ID,
            Self::NetVersion { .. } => NET_VERSION,
            Self::WalletRequestPermissions { .. } => WALLET_REQUEST_PERMISSIONS,
            Self::WalletSwitchEthereumChain { .. } => WALLET_SWITCH_ETHEREUM_CHAIN,
            Self::Unsupported { method, .. } => method,
        }
    }

    /// Params as they go out in the host envelope.
    pub fn params(&self) -> &Value {
        match self {
            Self::EthAccounts { params }
            | Self::EthRequestAccounts { params }
            | Self::EthChainId { params }
            | Self::NetVersion { params }
            | Self::WalletRequestPermissions { params }
            | Self::WalletSwitchEthereumChain { params }
            | Self::Unsupported { params, .. } => params,
        }
    }
}

impl From<RequestPayload> for ProviderRequest {
    fn from(payload: RequestPayload) -> Self {
        Self::from_payload(payload)
    }
}

fn no_params() -> Value {
    Value::Array(Vec::new())
}

/// Caveat attached to a granted permission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caveat {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: Value,
}

/// EIP-2255 permission descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub parent_capability: String,
    pub caveats: Vec<Caveat>,
}

impl Permission {
    /// `eth_accounts` permission restricted to the given address.
    pub fn eth_accounts(address: &str) -> Self {
        Self {
            parent_capability: ETH_ACCOUNTS.to_string(),
            caveats: vec![Caveat {
                kind: "restrictReturnedAccounts".to_string(),
                value: serde_json::json!([address]),
            }],
        }
    }
}

/// Legacy JSON-RPC response handed to `send_async` callbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub id: Value,
    pub jsonrpc: String,
    pub result: Value,
}

impl JsonRpcResponse {
    pub fn new(id: Option<Value>, result: Value) -> Self {
        Self {
            id: id.unwrap_or(Value::Null),
            jsonrpc: "2.0".to_string(),
            result,
        }
    }
}
