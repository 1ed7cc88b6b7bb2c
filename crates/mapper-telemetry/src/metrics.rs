//! Prometheus metrics for the annotations mapper.
//!
//! All metrics follow the naming convention: `mapper_<subject>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: message outcomes (e.g., mapper_messages_delivered_total)
//! - **Histogram**: per-message handling time

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Histogram, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // MESSAGE METRICS
    // =========================================================================

    /// Messages handed to the mapper by the consume loop
    pub static ref MESSAGES_RECEIVED: Counter = Counter::new(
        "mapper_messages_received_total",
        "Total inbound messages handled by the mapper"
    ).expect("metric creation failed");

    /// Concept annotations published
    pub static ref MESSAGES_DELIVERED: Counter = Counter::new(
        "mapper_messages_delivered_total",
        "Total concept annotation messages published"
    ).expect("metric creation failed");

    /// Messages filtered out before decoding
    pub static ref MESSAGES_SKIPPED: CounterVec = CounterVec::new(
        Opts::new("mapper_messages_skipped_total", "Messages skipped by the whitelist"),
        &["reason"]  // reason: invalid_whitelist/excluded_system
    ).expect("metric creation failed");

    /// Messages dropped after an error
    pub static ref MESSAGES_FAILED: CounterVec = CounterVec::new(
        Opts::new("mapper_messages_failed_total", "Messages dropped after an error"),
        &["stage"]  // stage: decode/encode/publish
    ).expect("metric creation failed");

    /// Annotations dropped for an unsupported predicate
    pub static ref ANNOTATIONS_DROPPED: Counter = Counter::new(
        "mapper_annotations_dropped_total",
        "Total annotations dropped because their predicate is not supported"
    ).expect("metric creation failed");

    /// Time spent handling one message, publish included
    pub static ref MESSAGE_HANDLING_DURATION: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "mapper_message_handling_duration_seconds",
            "Time spent mapping and publishing one message"
        ).buckets(exponential_buckets(0.0001, 2.0, 15).expect("valid buckets"))
    ).expect("metric creation failed");

    // =========================================================================
    // TRANSPORT METRICS
    // =========================================================================

    /// Queue session connect attempts
    pub static ref TRANSPORT_CONNECT_ATTEMPTS: CounterVec = CounterVec::new(
        Opts::new("mapper_transport_connect_attempts_total", "Queue connect attempts"),
        &["side", "outcome"]  // side: producer/consumer, outcome: success/failed
    ).expect("metric creation failed");
}

/// Handle to the registry the metrics were registered with
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Messages
        Box::new(MESSAGES_RECEIVED.clone()),
        Box::new(MESSAGES_DELIVERED.clone()),
        Box::new(MESSAGES_SKIPPED.clone()),
        Box::new(MESSAGES_FAILED.clone()),
        Box::new(ANNOTATIONS_DROPPED.clone()),
        Box::new(MESSAGE_HANDLING_DURATION.clone()),
        // Transport
        Box::new(TRANSPORT_CONNECT_ATTEMPTS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
