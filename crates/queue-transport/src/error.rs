//! Transport error types.

use thiserror::Error;

/// Errors raised by queue sessions and connectors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// A publish was attempted before the producer session existed.
    #[error("producer is not connected to the queue")]
    ProducerNotConnected,

    /// A consumer operation was attempted before the session existed.
    #[error("consumer is not connected to the queue")]
    ConsumerNotConnected,

    /// The queue could not be reached.
    #[error("queue at {address} is unavailable")]
    Unavailable { address: String },

    /// The queue refused a message.
    #[error("failed to send message to topic {topic}: {reason}")]
    Send { topic: String, reason: String },

    /// The session was closed.
    #[error("session closed")]
    Closed,

    /// Consumer group lag is above the tolerated value.
    #[error("consumer lag on topic {topic} is {lag}, tolerance is {tolerance}")]
    LagExceeded {
        topic: String,
        lag: u64,
        tolerance: u64,
    },
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
