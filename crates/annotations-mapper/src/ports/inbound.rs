//! Inbound Ports (Driving Ports)
//!
//! The consume loop hands every message to a [`MessageHandler`].

use async_trait::async_trait;
use queue_transport::RawMessage;

use crate::error::MappingError;

/// Why a message was not mapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The whitelist pattern failed to compile, so nothing is admitted.
    InvalidWhitelist,
    /// `Origin-System-Id` did not match the whitelist.
    ExcludedSystem {
        /// Header value as received, empty when missing.
        origin_system_id: String,
    },
}

impl SkipReason {
    /// Metrics label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::InvalidWhitelist => "invalid_whitelist",
            SkipReason::ExcludedSystem { .. } => "excluded_system",
        }
    }
}

/// Result of processing one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingOutcome {
    /// Concept annotations were published.
    Delivered {
        /// Content UUID.
        uuid: String,
        /// Annotations carried by the outbound message.
        mapped: usize,
        /// Annotations dropped for an unsupported predicate.
        dropped: usize,
    },
    /// The message was filtered out before decoding.
    Skipped(SkipReason),
    /// The message was dropped after an error.
    Failed(MappingError),
}

impl MappingOutcome {
    /// Whether an outbound message was published.
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        matches!(self, MappingOutcome::Delivered { .. })
    }
}

/// Handler driven by the consume loop, one message at a time.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Process a message. Never fails: every error is handled internally.
    async fn handle_message(&self, message: RawMessage);
}
