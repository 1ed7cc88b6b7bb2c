//! # Queue Transport
//!
//! Capability interfaces the annotations mapper uses to talk to a message
//! queue, plus an in-memory broker that satisfies them.
//!
//! ## Capabilities
//!
//! ```text
//! ┌──────────────────────┐   connect_producer()   ┌──────────────────┐
//! │  TransportConnector  │ ─────────────────────→ │ MessageProducer  │ send_message()
//! │                      │                        └──────────────────┘ connectivity_check()
//! │                      │   connect_consumer()   ┌──────────────────┐
//! │                      │ ─────────────────────→ │ MessageConsumer  │ next_message()
//! └──────────────────────┘                        └──────────────────┘ connectivity_check()
//! ```
//!
//! Sessions are opened through a [`TransportConnector`]. The mapper's retry
//! wrappers compose around a connector and expose the same producer/consumer
//! traits, so the mapper never sees whether a session exists yet.
//!
//! ## In-Memory Broker
//!
//! [`InMemoryBroker`] keeps one append-only log per topic and a committed
//! offset per consumer group. It can be switched unavailable to simulate an
//! outage.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod broker;
pub mod consumer;
pub mod error;
pub mod message;
pub mod producer;

// Re-export main types
pub use broker::{InMemoryBroker, MemoryConsumer, MemoryProducer};
pub use consumer::MessageConsumer;
pub use error::{TransportError, TransportResult};
pub use message::{headers, RawMessage};
pub use producer::MessageProducer;

use async_trait::async_trait;

/// Suffix appended to a consumer group for connectivity probe sessions.
pub const HEALTHCHECK_GROUP_SUFFIX: &str = "-healthcheck";

/// Opens producer and consumer sessions against a queue.
///
/// A failed connect is reported as an error; retrying is the caller's job.
#[async_trait]
pub trait TransportConnector: Send + Sync {
    /// Producer session type.
    type Producer: MessageProducer + 'static;

    /// Consumer session type.
    type Consumer: MessageConsumer + 'static;

    /// Open a producer session writing to `topic`.
    async fn connect_producer(&self, topic: &str) -> TransportResult<Self::Producer>;

    /// Open a consumer session reading `topics` as member of `group`.
    async fn connect_consumer(
        &self,
        group: &str,
        topics: &[String],
    ) -> TransportResult<Self::Consumer>;

    /// Address of the queue, for logging.
    fn address(&self) -> &str;
}
