//! Outcome reporter backed by `tracing` and Prometheus.

use mapper_telemetry::{
    log_message_event, metric_inc, ANNOTATIONS_DROPPED, MESSAGES_DELIVERED, MESSAGES_FAILED,
    MESSAGES_RECEIVED, MESSAGES_SKIPPED,
};

use crate::ports::inbound::{MappingOutcome, SkipReason};
use crate::ports::outbound::OutcomeReporter;

/// Default [`OutcomeReporter`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl OutcomeReporter for TracingReporter {
    fn record(&self, transaction_id: &str, outcome: &MappingOutcome) {
        metric_inc!(MESSAGES_RECEIVED);

        match outcome {
            MappingOutcome::Delivered {
                uuid,
                mapped,
                dropped,
            } => {
                metric_inc!(MESSAGES_DELIVERED);
                log_message_event!(
                    info,
                    transaction_id,
                    "Concept annotations delivered",
                    uuid = %uuid,
                    mapped = *mapped,
                    dropped = *dropped
                );
            }
            MappingOutcome::Skipped(reason) => {
                metric_inc!(MESSAGES_SKIPPED, &[reason.label()]);
                match reason {
                    SkipReason::InvalidWhitelist => log_message_event!(
                        error,
                        transaction_id,
                        "Skipping message: whitelist regex is invalid"
                    ),
                    SkipReason::ExcludedSystem { origin_system_id } => log_message_event!(
                        info,
                        transaction_id,
                        "Skipping annotations published with an origin system not in the whitelist",
                        origin_system_id = %origin_system_id
                    ),
                }
            }
            MappingOutcome::Failed(error) => {
                metric_inc!(MESSAGES_FAILED, &[error.stage()]);
                log_message_event!(
                    error,
                    transaction_id,
                    "Message dropped",
                    stage = error.stage(),
                    error = %error
                );
            }
        }
    }

    fn unsupported_predicate(&self, transaction_id: &str, uuid: &str, predicate: &str) {
        metric_inc!(ANNOTATIONS_DROPPED);
        log_message_event!(
            warn,
            transaction_id,
            "Annotation dropped: unsupported predicate",
            uuid = %uuid,
            predicate = %predicate
        );
    }
}
