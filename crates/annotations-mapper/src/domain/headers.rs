//! Header rules for outbound concept annotation messages.

use chrono::{DateTime, Utc};
use queue_transport::{headers, RawMessage};
use std::collections::HashMap;
use uuid::Uuid;

/// `Message-Type` value on every outbound message.
pub const CONCEPT_ANNOTATION_MESSAGE_TYPE: &str = "concept-annotation";

/// Transaction id used in logs when the inbound message has none.
pub const UNKNOWN_TRANSACTION_ID: &str = "unknown";

/// Millisecond precision, UTC, literal `Z` suffix.
const MESSAGE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Transaction id of an inbound message, for log correlation.
#[must_use]
pub fn transaction_id(message: &RawMessage) -> &str {
    message
        .header(headers::REQUEST_ID)
        .unwrap_or(UNKNOWN_TRANSACTION_ID)
}

/// Format a timestamp as carried in `Message-Timestamp`.
#[must_use]
pub fn format_message_timestamp(at: DateTime<Utc>) -> String {
    at.format(MESSAGE_TIMESTAMP_FORMAT).to_string()
}

/// Headers for the concept annotations derived from `inbound`.
///
/// `Message-Id` is fresh per call. `Content-Type`, `X-Request-Id` and
/// `Origin-System-Id` are copied from the inbound message, empty when absent.
#[must_use]
pub fn build_concept_annotations_headers(
    inbound: &RawMessage,
    now: DateTime<Utc>,
) -> HashMap<String, String> {
    let propagated = |name: &str| inbound.header(name).unwrap_or_default().to_string();

    HashMap::from([
        (headers::MESSAGE_ID.to_string(), Uuid::new_v4().to_string()),
        (
            headers::MESSAGE_TYPE.to_string(),
            CONCEPT_ANNOTATION_MESSAGE_TYPE.to_string(),
        ),
        (
            headers::MESSAGE_TIMESTAMP.to_string(),
            format_message_timestamp(now),
        ),
        (
            headers::CONTENT_TYPE.to_string(),
            propagated(headers::CONTENT_TYPE),
        ),
        (
            headers::REQUEST_ID.to_string(),
            propagated(headers::REQUEST_ID),
        ),
        (
            headers::ORIGIN_SYSTEM_ID.to_string(),
            propagated(headers::ORIGIN_SYSTEM_ID),
        ),
    ])
}
