//! Provider error types.
//!
//! `ProviderRpcError` is what page code sees (EIP-1193 shape). `BridgeError`
//! is the internal taxonomy; apart from host rejections these never cross a
//! boundary and end up as log lines.

use crate::ports::outbound::{ChannelError, StorageError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// EIP-1193 and JSON-RPC 2.0 error codes
pub mod codes {
    // EIP-1193 provider errors
    pub const USER_REJECTED: i32 = 4001;
    pub const UNAUTHORIZED: i32 = 4100;
    pub const UNSUPPORTED_METHOD: i32 = 4200;
    pub const DISCONNECTED: i32 = 4900;
    pub const CHAIN_DISCONNECTED: i32 = 4901;

    // JSON-RPC 2.0 standard errors
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// Error delivered to the page caller of a provider request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ProviderRpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// The host channel is not installed; the request was never sent.
    pub fn channel_unavailable() -> Self {
        Self::new(codes::DISCONNECTED, "host channel is not available")
    }

    /// Posting to the host channel failed.
    pub fn channel_send(details: impl fmt::Display) -> Self {
        Self::new(
            codes::DISCONNECTED,
            format!("failed to reach host: {}", details),
        )
    }

    /// The host explicitly rejected the request. The message is passed
    /// through verbatim.
    pub fn host_rejected(message: impl Into<String>) -> Self {
        Self::new(codes::INTERNAL_ERROR, message)
    }

    /// The bridge was torn down before the request completed.
    pub fn bridge_closed() -> Self {
        Self::new(codes::DISCONNECTED, "provider bridge closed")
    }

    /// The account was disconnected by the host.
    pub fn disconnected() -> Self {
        Self::new(codes::DISCONNECTED, "provider disconnected")
    }

    pub fn invalid_params(details: impl Into<String>) -> Self {
        Self::new(
            codes::INVALID_PARAMS,
            format!("Invalid params: {}", details.into()),
        )
    }

    pub fn internal(details: impl Into<String>) -> Self {
        Self::new(
            codes::INTERNAL_ERROR,
            format!("Internal error: {}", details.into()),
        )
    }
}

impl fmt::Display for ProviderRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ProviderRpcError {}

impl From<serde_json::Error> for ProviderRpcError {
    fn from(e: serde_json::Error) -> Self {
        ProviderRpcError::invalid_params(e.to_string())
    }
}

/// Internal bridge errors.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// No host channel installed
    #[error("host channel unavailable")]
    ChannelUnavailable,

    /// The host channel refused the message
    #[error("host channel send failed: {0}")]
    ChannelSend(#[from] ChannelError),

    /// Completion for an id with no pending entry
    #[error("unknown request id: {0}")]
    UnknownRequestId(String),

    /// Completion payload could not be parsed
    #[error("malformed result for request {id}: {reason}")]
    MalformedResult { id: String, reason: String },

    /// An event listener failed
    #[error("listener for '{event}' failed: {reason}")]
    SubscriberFailure { event: String, reason: String },

    /// Durable storage write failed
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),

    /// Envelope could not be encoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] crate::domain::config::ConfigError),
}

impl From<BridgeError> for ProviderRpcError {
    fn from(e: BridgeError) -> Self {
        match e {
            BridgeError::ChannelUnavailable => ProviderRpcError::channel_unavailable(),
            BridgeError::ChannelSend(inner) => ProviderRpcError::channel_send(inner),
            other => ProviderRpcError::internal(other.to_string()),
        }
    }
}
