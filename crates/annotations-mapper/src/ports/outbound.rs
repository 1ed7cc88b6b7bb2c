//! Outbound Ports (Driven Ports)
//!
//! The queue producer port lives in `queue_transport::MessageProducer`.

use crate::ports::inbound::MappingOutcome;

/// Receives per-message outcomes for logging and metrics.
pub trait OutcomeReporter: Send + Sync {
    /// Record the outcome of one message.
    fn record(&self, transaction_id: &str, outcome: &MappingOutcome);

    /// An annotation was dropped because its predicate is not supported.
    fn unsupported_predicate(&self, transaction_id: &str, uuid: &str, predicate: &str);
}
