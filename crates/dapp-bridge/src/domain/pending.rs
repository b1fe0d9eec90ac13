//! Correlation table for forwarded requests.
//!
//! Flow:
//! 1. The provider calls `register()` with a responder and gets a `RequestId`
//! 2. The id travels to the host inside the envelope
//! 3. The host calls back with `resolve()` or `reject()` for that id
//! 4. The entry is removed, then its responder runs exactly once
//!
//! There is no timeout: an id the host never completes stays registered.

use crate::domain::correlation::RequestId;
use crate::domain::error::{BridgeError, ProviderRpcError};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, warn};

/// Continuation of a forwarded request: `Ok` for a host result, `Err` for a
/// host rejection or local send failure.
pub type Responder = Box<dyn FnOnce(Result<Value, ProviderRpcError>) + Send>;

/// A forwarded request waiting for the host
struct PendingRequest {
    /// Method name (for logging)
    method: String,
    /// When the request was registered
    registered_at: Instant,
    /// Locked only so the table is `Sync`; taken once on removal
    responder: Mutex<Responder>,
}

/// Result payload as the host hands it over.
#[derive(Debug, Clone, PartialEq)]
pub enum HostResult {
    /// JSON text, parsed on arrival
    Text(String),
    /// Already structured
    Value(Value),
}

impl HostResult {
    fn into_value(self) -> Result<Value, serde_json::Error> {
        match self {
            HostResult::Text(text) => serde_json::from_str(&text),
            HostResult::Value(value) => Ok(value),
        }
    }
}

impl From<&str> for HostResult {
    fn from(s: &str) -> Self {
        HostResult::Text(s.to_string())
    }
}

impl From<String> for HostResult {
    fn from(s: String) -> Self {
        HostResult::Text(s)
    }
}

impl From<Value> for HostResult {
    fn from(v: Value) -> Self {
        HostResult::Value(v)
    }
}

/// What a completion call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Entry found, responder got the value
    Resolved,
    /// Entry found, responder got the error
    Rejected,
    /// No pending entry for the id; nothing happened
    UnknownId,
    /// Result could not be parsed; the entry is still pending
    MalformedResult,
    /// Host message was not a completion envelope
    Ignored,
}

/// Counters for the correlation table
#[derive(Debug, Default)]
pub struct PendingStats {
    pub total_registered: AtomicU64,
    pub total_resolved: AtomicU64,
    pub total_rejected: AtomicU64,
    pub total_unknown: AtomicU64,
    pub total_malformed: AtomicU64,
}

/// Outstanding forwarded requests keyed by correlation id.
pub struct PendingRequestTable {
    pending: DashMap<RequestId, PendingRequest>,
    stats: PendingStats,
}

impl PendingRequestTable {
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
            stats: PendingStats::default(),
        }
    }

    /// Store a responder under a fresh id.
    pub fn register(&self, method: &str, responder: Responder) -> RequestId {
        let id = RequestId::new();
        self.pending.insert(
            id,
            PendingRequest {
                method: method.to_string(),
                registered_at: Instant::now(),
                responder: Mutex::new(responder),
            },
        );
        self.stats.total_registered.fetch_add(1, Ordering::Relaxed);

        debug!(correlation_id = %id, method = method, "Registered pending request");
        id
    }

    /// Complete `id` with a host result.
    pub fn resolve(&self, id: &str, result: HostResult) -> CompletionOutcome {
        let Some(request_id) = self.lookup(id) else {
            return CompletionOutcome::UnknownId;
        };

        let value = match result.into_value() {
            Ok(value) => value,
            Err(e) => {
                let err = BridgeError::MalformedResult {
                    id: id.to_string(),
                    reason: e.to_string(),
                };
                warn!(correlation_id = %request_id, error = %err, "Dropping host result");
                self.stats.total_malformed.fetch_add(1, Ordering::Relaxed);
                return CompletionOutcome::MalformedResult;
            }
        };

        match self.pending.remove(&request_id) {
            Some((_, request)) => {
                debug!(
                    correlation_id = %request_id,
                    method = %request.method,
                    elapsed_ms = request.registered_at.elapsed().as_millis() as u64,
                    "Resolved pending request"
                );
                self.stats.total_resolved.fetch_add(1, Ordering::Relaxed);
                (request.responder.into_inner())(Ok(value));
                CompletionOutcome::Resolved
            }
            None => self.unknown(id),
        }
    }

    /// Complete `id` with a host rejection.
    pub fn reject(&self, id: &str, message: &str) -> CompletionOutcome {
        let Some(request_id) = self.lookup(id) else {
            return CompletionOutcome::UnknownId;
        };
        match self.fail(&request_id, ProviderRpcError::host_rejected(message)) {
            true => CompletionOutcome::Rejected,
            false => self.unknown(id),
        }
    }

    /// Remove `id` and hand `error` to its responder. Returns `false` if the
    /// id was not pending.
    pub fn fail(&self, id: &RequestId, error: ProviderRpcError) -> bool {
        let Some((_, request)) = self.pending.remove(id) else {
            return false;
        };
        debug!(
            correlation_id = %id,
            method = %request.method,
            error = %error,
            "Rejected pending request"
        );
        self.stats.total_rejected.fetch_add(1, Ordering::Relaxed);
        (request.responder.into_inner())(Err(error));
        true
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, id: &RequestId) -> bool {
        self.pending.contains_key(id)
    }

    pub fn stats(&self) -> &PendingStats {
        &self.stats
    }

    fn lookup(&self, id: &str) -> Option<RequestId> {
        match RequestId::parse(id) {
            Ok(request_id) if self.pending.contains_key(&request_id) => Some(request_id),
            _ => {
                self.unknown(id);
                None
            }
        }
    }

    fn unknown(&self, id: &str) -> CompletionOutcome {
        self.stats.total_unknown.fetch_add(1, Ordering::Relaxed);
        let err = BridgeError::UnknownRequestId(id.to_string());
        debug!(error = %err, "Ignoring completion");
        CompletionOutcome::UnknownId
    }
}

impl Default for PendingRequestTable {
    fn default() -> Self {
        Self::new()
    }
}
