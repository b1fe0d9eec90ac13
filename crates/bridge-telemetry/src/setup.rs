//! Subscriber assembly.
//!
//! Registry + `EnvFilter`, with an optional console layer (pretty or JSON) and
//! an optional [`HostLogLayer`].

use crate::sink::{HostLogLayer, LogSink};
use crate::{TelemetryConfig, TelemetryError};
use std::sync::Arc;
use tracing::Subscriber;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Build the subscriber without installing it.
pub fn build_subscriber(
    config: &TelemetryConfig,
    sink: Option<Arc<dyn LogSink>>,
) -> Result<impl Subscriber + Send + Sync + 'static, TelemetryError> {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::Filter(e.to_string()))?;

    let console = config.console_output.then(|| console_layer(config.json_logs));
    let host = sink.map(HostLogLayer::new);

    Ok(tracing_subscriber::registry()
        .with(console)
        .with(host)
        .with(env_filter))
}

fn console_layer(json: bool) -> BoxedLayer {
    if json {
        // JSON output for log collectors
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .boxed()
    } else {
        // Pretty output for development
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(true)
            .boxed()
    }
}
