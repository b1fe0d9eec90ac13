//! Domain types for the provider bridge.
//!
//! State, correlation bookkeeping, events and configuration. Nothing here
//! talks to the host directly; that goes through `crate::ports`.

pub mod chain;
pub mod config;
pub mod correlation;
pub mod error;
pub mod events;
pub mod markers;
pub mod methods;
pub mod pending;
pub mod state;
pub mod turns;

// Re-exports for convenience
pub use chain::{network_version, ChainDescriptor, MAINNET_CHAIN_ID};
pub use config::{BridgeConfig, ConfigError, ProviderFlags, StorageConfig};
pub use correlation::RequestId;
pub use error::{codes, BridgeError, ProviderRpcError};
pub use events::{
    listener, DispatchReport, EventName, EventRegistry, Listener, ListenerError, ListenerId,
    ProviderEvent, UnknownEvent,
};
pub use methods::{JsonRpcResponse, Permission, ProviderRequest, RequestPayload};
pub use pending::{CompletionOutcome, HostResult, PendingRequestTable, Responder};
pub use state::{ProviderState, StateSnapshot};
pub use turns::TurnQueue;
