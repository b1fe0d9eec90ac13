//! Host log sink.
//!
//! The page has no console the host can see, so every log record is flattened
//! to one line and posted to the host:
//!
//! `[LEVEL] target: message key=value key=value`
//!
//! String fields are written as-is when they contain no whitespace and as JSON
//! strings otherwise.

use parking_lot::Mutex;
use std::fmt::{self, Write as _};
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Host-side receiver of formatted log lines.
pub trait LogSink: Send + Sync {
    fn post_log(&self, line: &str);
}

/// `tracing` layer forwarding every event to a [`LogSink`].
#[derive(Clone)]
pub struct HostLogLayer {
    sink: Arc<dyn LogSink>,
}

impl HostLogLayer {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }
}

impl<S: Subscriber> Layer<S> for HostLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut line = LineVisitor::default();
        event.record(&mut line);
        self.sink
            .post_log(&line.finish(metadata.level(), metadata.target()));
    }
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl LineVisitor {
    fn push_field(&mut self, name: &str, value: &str) {
        let _ = write!(self.fields, " {}={}", name, value);
    }

    fn finish(self, level: &Level, target: &str) -> String {
        format!("[{}] {}: {}{}", level, target, self.message, self.fields)
    }
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else if value.is_empty() || value.contains(char::is_whitespace) {
            let quoted = serde_json::Value::String(value.to_string()).to_string();
            self.push_field(field.name(), &quoted);
        } else {
            self.push_field(field.name(), value);
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push_field(field.name(), &value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push_field(field.name(), &value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push_field(field.name(), &value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let rendered = format!("{:?}", value);
        if field.name() == "message" {
            self.message = rendered;
        } else {
            self.push_field(field.name(), &rendered);
        }
    }
}

/// Sink that keeps lines in memory. For hosts that batch log delivery, and
/// for tests.
#[derive(Debug, Default)]
pub struct BufferSink {
    lines: Mutex<Vec<String>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every line posted so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Take the buffered lines, leaving the buffer empty.
    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock())
    }
}

impl LogSink for BufferSink {
    fn post_log(&self, line: &str) {
        self.lines.lock().push(line.to_string());
    }
}
