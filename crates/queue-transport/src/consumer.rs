//! # Message Consumer
//!
//! Defines the consuming side of a queue session.

use crate::error::TransportResult;
use crate::message::RawMessage;
use async_trait::async_trait;

/// Trait for reading messages from subscribed topics.
#[async_trait]
pub trait MessageConsumer: Send + Sync {
    /// Wait for the next message.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(message))` - The next message for this consumer group
    /// - `Ok(None)` - The session was closed while waiting
    async fn next_message(&self) -> TransportResult<Option<RawMessage>>;

    /// Check that the queue is reachable for this consumer.
    async fn connectivity_check(&self) -> TransportResult<()>;

    /// Check that consumer group lag stays within `tolerance` messages.
    async fn monitor_check(&self, tolerance: u64) -> TransportResult<()>;

    /// Close the session. Pending `next_message` calls return `Ok(None)`.
    async fn close(&self) -> TransportResult<()>;
}
