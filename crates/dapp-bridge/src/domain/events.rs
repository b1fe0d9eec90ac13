//! Event registry and dispatch.
//!
//! Listeners are kept per event name in registration order. Dispatch works on
//! a snapshot of the list taken when it starts, and no lock is held while a
//! listener runs, so listeners are free to call back into the provider.

use crate::domain::error::{BridgeError, ProviderRpcError};
use parking_lot::RwLock;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Events a page can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    AccountsChanged,
    ChainChanged,
    Connect,
    Disconnect,
    RequestError,
}

impl EventName {
    pub const ALL: [EventName; 5] = [
        EventName::AccountsChanged,
        EventName::ChainChanged,
        EventName::Connect,
        EventName::Disconnect,
        EventName::RequestError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::AccountsChanged => "accountsChanged",
            EventName::ChainChanged => "chainChanged",
            EventName::Connect => "connect",
            EventName::Disconnect => "disconnect",
            EventName::RequestError => "requestError",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event name outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event: {0}")]
pub struct UnknownEvent(pub String);

impl FromStr for EventName {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| UnknownEvent(s.to_string()))
    }
}

/// Typed event with its page-visible payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    AccountsChanged(Vec<String>),
    ChainChanged(String),
    Connect { chain_id: String },
    Disconnect(ProviderRpcError),
}

impl ProviderEvent {
    pub fn name(&self) -> EventName {
        match self {
            ProviderEvent::AccountsChanged(_) => EventName::AccountsChanged,
            ProviderEvent::ChainChanged(_) => EventName::ChainChanged,
            ProviderEvent::Connect { .. } => EventName::Connect,
            ProviderEvent::Disconnect(_) => EventName::Disconnect,
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            ProviderEvent::AccountsChanged(accounts) => serde_json::json!(accounts),
            ProviderEvent::ChainChanged(chain_id) => Value::String(chain_id.clone()),
            ProviderEvent::Connect { chain_id } => serde_json::json!({ "chainId": chain_id }),
            ProviderEvent::Disconnect(error) => serde_json::to_value(error).unwrap_or_default(),
        }
    }
}

/// Error a listener reports back to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ListenerError(pub String);

impl From<&str> for ListenerError {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ListenerError {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Page-registered event callback.
pub type Listener = Arc<dyn Fn(&Value) -> Result<(), ListenerError> + Send + Sync>;

/// Wrap a closure as a [`Listener`].
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&Value) -> Result<(), ListenerError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Handle returned by registration, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Outcome of one dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Listeners that returned normally
    pub delivered: usize,
    /// Listeners that returned an error or panicked
    pub failed: usize,
}

/// Event name to ordered listener list.
pub struct EventRegistry {
    listeners: RwLock<HashMap<EventName, Vec<(ListenerId, Listener)>>>,
    next_id: AtomicU64,
}

impl EventRegistry {
    pub fn new() -> Self {
        let listeners = EventName::ALL
            .into_iter()
            .map(|name| (name, Vec::new()))
            .collect();
        Self {
            listeners: RwLock::new(listeners),
            next_id: AtomicU64::new(1),
        }
    }

    /// Append a listener. The same callback may be registered more than once.
    pub fn add(&self, event: EventName, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .entry(event)
            .or_default()
            .push((id, listener));
        debug!(event = %event, listener = %id, "Registered listener");
        id
    }

    /// Remove one registration by handle.
    pub fn remove(&self, event: EventName, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let Some(list) = listeners.get_mut(&event) else {
            return false;
        };
        let before = list.len();
        list.retain(|(entry, _)| *entry != id);
        before != list.len()
    }

    /// Remove every registration of `callback` (pointer identity).
    pub fn remove_callback(&self, event: EventName, callback: &Listener) -> usize {
        let target = Arc::as_ptr(callback) as *const ();
        let mut listeners = self.listeners.write();
        let Some(list) = listeners.get_mut(&event) else {
            return 0;
        };
        let before = list.len();
        list.retain(|(_, l)| Arc::as_ptr(l) as *const () != target);
        before - list.len()
    }

    pub fn contains(&self, event: EventName, id: ListenerId) -> bool {
        self.listeners
            .read()
            .get(&event)
            .is_some_and(|list| list.iter().any(|(entry, _)| *entry == id))
    }

    pub fn listener_count(&self, event: EventName) -> usize {
        self.listeners.read().get(&event).map_or(0, Vec::len)
    }

    /// Invoke every listener registered for `event` when dispatch starts.
    pub fn trigger(&self, event: EventName, data: &Value) -> DispatchReport {
        let snapshot: Vec<(ListenerId, Listener)> = self
            .listeners
            .read()
            .get(&event)
            .cloned()
            .unwrap_or_default();

        let mut report = DispatchReport::default();
        for (id, listener) in snapshot {
            match invoke_listener(event, &listener, data) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!(event = %event, listener = %id, error = %e, "Event listener failed");
                    report.failed += 1;
                }
            }
        }

        debug!(
            event = %event,
            delivered = report.delivered,
            failed = report.failed,
            "Event dispatched"
        );
        report
    }

    pub fn emit(&self, event: &ProviderEvent) -> DispatchReport {
        self.trigger(event.name(), &event.payload())
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Run one listener, turning both errors and panics into `SubscriberFailure`.
pub(crate) fn invoke_listener(
    event: EventName,
    listener: &Listener,
    data: &Value,
) -> Result<(), BridgeError> {
    let reason = match panic::catch_unwind(AssertUnwindSafe(|| listener(data))) {
        Ok(Ok(())) => return Ok(()),
        Ok(Err(e)) => e.to_string(),
        Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
    };
    Err(BridgeError::SubscriberFailure {
        event: event.to_string(),
        reason,
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
