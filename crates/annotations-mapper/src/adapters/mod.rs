//! Adapters (driven side)
//!
//! - [`ProxyProducer`] / [`ProxyConsumer`]: reconnecting wrappers around a
//!   [`queue_transport::TransportConnector`]
//! - [`TracingReporter`]: logs outcomes and bumps Prometheus counters

pub mod proxy_consumer;
pub mod proxy_producer;
pub mod reporter;

pub use proxy_consumer::ProxyConsumer;
pub use proxy_producer::ProxyProducer;
pub use reporter::TracingReporter;

use std::time::Duration;

/// Wait between failed connect attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(60);
