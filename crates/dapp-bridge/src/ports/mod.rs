//! Ports (hexagonal boundaries).
//!
//! Inbound ports are what the host calls; outbound ports are what the bridge
//! needs from the host.

pub mod inbound;
pub mod outbound;

pub use inbound::{ConnectFuture, HostCompletion, HostControl};
pub use outbound::{ChannelError, DurableStorage, HostChannel, StorageError};
