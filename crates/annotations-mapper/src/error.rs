//! Error types for the mapping pipeline.

use queue_transport::TransportError;
use thiserror::Error;

/// Per-message mapping failures. None of these stop the consume loop.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// Body was not a valid metadata publish event.
    #[error("cannot unmarshal message body: {reason}")]
    Decode { reason: String },

    /// Concept annotations could not be serialized.
    #[error("error marshalling the concept annotations: {reason}")]
    Encode { reason: String },

    /// The queue rejected the outbound message.
    #[error("error sending concept annotation to queue: {0}")]
    Publish(#[from] TransportError),
}

impl MappingError {
    /// Pipeline stage the error came from, used as a metrics label.
    #[must_use]
    pub fn stage(&self) -> &'static str {
        match self {
            MappingError::Decode { .. } => "decode",
            MappingError::Encode { .. } => "encode",
            MappingError::Publish(_) => "publish",
        }
    }
}

/// Result type for mapping operations.
pub type MappingResult<T> = Result<T, MappingError>;
