//! Outbound ports: what the bridge needs from its host environment.

/// One-way text channel to the native host.
///
/// Mirrors the webview substrate: post a string, get no reply. Replies come
/// back later through the host-callable entry points.
pub trait HostChannel: Send + Sync {
    /// Post one serialized envelope to the host.
    fn post_message(&self, message: &str) -> Result<(), ChannelError>;
}

/// Page-scoped durable key/value storage (the page's local storage).
///
/// Best-effort only: every caller tolerates failures.
pub trait DurableStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Host channel errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("channel closed")]
    Closed,
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Durable storage errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("storage not available: {0}")]
    Unavailable(String),
    #[error("storage write rejected for key '{key}': {reason}")]
    WriteRejected { key: String, reason: String },
}
