//! # Mapper Telemetry
//!
//! Logging and metrics for the PAC annotations mapper.
//!
//! ## Components
//!
//! - **Logs**: `tracing` events rendered by `tracing-subscriber`, JSON in
//!   containers and pretty output for development
//! - **Metrics**: Prometheus counters for message outcomes and transport
//!   connects, exposed in text format via [`encode_metrics`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mapper_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = TelemetryConfig::for_service("pac-annotations-mapper", "info", true);
//!     let _guard = init_telemetry(config)?;
//!     // ...
//!     Ok(())
//! }
//! ```
//!
//! `RUST_LOG`, when set, overrides the configured log level.

#![cfg_attr(test, allow(clippy::unwrap_used))]

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, MetricsHandle, ANNOTATIONS_DROPPED,
    MESSAGES_DELIVERED, MESSAGES_FAILED, MESSAGES_RECEIVED, MESSAGES_SKIPPED,
    MESSAGE_HANDLING_DURATION, TRANSPORT_CONNECT_ATTEMPTS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize log subscriber: {0}")]
    SubscriberInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics and install the global log subscriber.
///
/// Returns a guard that must be held for the lifetime of the application.
/// Fails if a global subscriber is already installed.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics_handle = register_metrics()?;
    logging::init_logging(&config)?;

    tracing::info!(
        service = %config.service_name,
        log_level = %config.log_level,
        json_logs = config.json_logs,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        service_name: config.service_name,
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}

/// Log an event about one queue message, tagged with its transaction id.
///
/// # Example
///
/// ```rust,ignore
/// use mapper_telemetry::log_message_event;
///
/// log_message_event!(info, tid, "Message delivered", uuid = %uuid);
/// ```
#[macro_export]
macro_rules! log_message_event {
    ($level:ident, $transaction_id:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            transaction_id = %$transaction_id,
            $($($field)*,)?
            $msg
        )
    };
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
