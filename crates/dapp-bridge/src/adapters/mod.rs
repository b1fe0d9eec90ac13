//! Adapters: wire format for the host, plus in-process port implementations.

pub mod channel;
pub mod host_bridge;
pub mod storage;

pub use channel::MpscChannel;
pub use host_bridge::{HostBridge, HostEnvelope};
pub use storage::{InMemoryStorage, UnavailableStorage};
