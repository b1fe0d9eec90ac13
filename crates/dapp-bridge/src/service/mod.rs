//! Facades over the shared bridge state.

pub(crate) mod context;
pub mod controller;
pub mod provider;

pub use controller::Controller;
pub use provider::{LegacyCall, Provider, ReplyFuture};
