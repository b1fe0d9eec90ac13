//! Host bridge adapter.
//!
//! Wire format between the bridge and the native host, and the host-callable
//! completion entry points.
//!
//! Outgoing: `{"id": "...", "method": "...", "params": [...], "chainId": "0x1"}`
//! Incoming (text form): `{"id": "...", "result": ...}` or
//! `{"id": "...", "error": "..." | {"message": "..."}}`

use crate::domain::error::BridgeError;
use crate::domain::pending::{CompletionOutcome, HostResult};
use crate::ports::inbound::HostCompletion;
use crate::service::context::BridgeCore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Request envelope posted to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostEnvelope {
    /// Correlation id the host echoes back on completion
    pub id: String,
    pub method: String,
    /// Array or object, `[]` when the page passed none
    pub params: Value,
    /// Chain id at the time of sending
    pub chain_id: String,
}

impl HostEnvelope {
    pub fn encode(&self) -> Result<String, BridgeError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Completion entry points, as exposed to the host.
#[derive(Clone)]
pub struct HostBridge {
    core: Arc<BridgeCore>,
}

impl HostBridge {
    pub(crate) fn new(core: Arc<BridgeCore>) -> Self {
        Self { core }
    }

    /// Requests forwarded and not yet completed.
    pub fn pending_count(&self) -> usize {
        self.core.pending.pending_count()
    }
}

impl HostCompletion for HostBridge {
    fn resolve_request(&self, id: &str, result: HostResult) -> CompletionOutcome {
        self.core.pending.resolve(id, result)
    }

    fn reject_request(&self, id: &str, message: &str) -> CompletionOutcome {
        self.core.pending.reject(id, message)
    }

    fn dispatch_host_message(&self, text: &str) -> CompletionOutcome {
        let mut fields = match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => {
                warn!("Ignoring host message: not a JSON object");
                return CompletionOutcome::Ignored;
            }
            Err(e) => {
                warn!(error = %e, "Ignoring unparseable host message");
                return CompletionOutcome::Ignored;
            }
        };

        let Some(id) = fields.get("id").and_then(id_text) else {
            warn!("Ignoring host message without id");
            return CompletionOutcome::Ignored;
        };

        if let Some(error) = fields.remove("error") {
            return self.reject_request(&id, &error_message(error));
        }
        if let Some(result) = fields.remove("result") {
            return self.resolve_request(&id, HostResult::Value(result));
        }

        debug!(correlation_id = id, "Host message has neither result nor error");
        CompletionOutcome::Ignored
    }
}

fn id_text(id: &Value) -> Option<String> {
    match id {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn error_message(error: Value) -> String {
    match error {
        Value::String(message) => message,
        Value::Object(ref map) => message_field(map).unwrap_or_else(|| error.to_string()),
        other => other.to_string(),
    }
}

fn message_field(map: &Map<String, Value>) -> Option<String> {
    map.get("message").and_then(Value::as_str).map(str::to_string)
}
