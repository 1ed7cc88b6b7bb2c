//! # Message Producer
//!
//! Defines the publishing side of a queue session.

use crate::error::TransportResult;
use crate::message::RawMessage;
use async_trait::async_trait;

/// Trait for publishing messages to a queue topic.
///
/// Implementations must be safe for concurrent `send_message` calls.
#[async_trait]
pub trait MessageProducer: Send + Sync {
    /// Publish a message.
    async fn send_message(&self, message: RawMessage) -> TransportResult<()>;

    /// Check that the queue is reachable through this producer.
    async fn connectivity_check(&self) -> TransportResult<()>;

    /// Close the session. Further sends fail.
    async fn close(&self) -> TransportResult<()>;
}
