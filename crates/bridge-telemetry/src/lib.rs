//! # Bridge Telemetry
//!
//! Logging for the provider bridge.
//!
//! ## Components
//!
//! - `EnvFilter` driven by `BRIDGE_LOG_LEVEL` / `RUST_LOG`
//! - Console output, pretty or JSON
//! - [`HostLogLayer`]: every record flattened to one line and posted to the
//!   native host through a [`LogSink`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bridge_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! let _guard = init_telemetry(&config, Some(host_sink)).expect("Failed to init telemetry");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BRIDGE_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `BRIDGE_CONSOLE_OUTPUT` | `true` | Console output |
//! | `BRIDGE_JSON_LOGS` | `false` | JSON console output |
//! | `BRIDGE_SERVICE_NAME` | `dapp-bridge` | Service name |

mod config;
mod setup;
mod sink;

pub use config::TelemetryConfig;
pub use setup::build_subscriber;
pub use sink::{BufferSink, HostLogLayer, LogSink};

use std::sync::Arc;
use thiserror::Error;
use tracing_subscriber::util::SubscriberInitExt;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Failed to install global subscriber: {0}")]
    Install(String),
}

/// Install the global subscriber.
///
/// Returns a guard to hold for the lifetime of the bridge. Fails if a global
/// subscriber is already installed.
pub fn init_telemetry(
    config: &TelemetryConfig,
    sink: Option<Arc<dyn LogSink>>,
) -> Result<TelemetryGuard, TelemetryError> {
    let host_sink = sink.is_some();
    build_subscriber(config, sink)?
        .try_init()
        .map_err(|e| TelemetryError::Install(e.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        log_level = %config.log_level,
        host_sink = host_sink,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        service_name: config.service_name.clone(),
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry...");
    }
}
