//! Annotation Mapper Service
//!
//! Filters inbound metadata publish events by origin system, remaps their
//! predicates and hands the result to the producer.

use async_trait::async_trait;
use chrono::Utc;
use queue_transport::{headers, MessageProducer, RawMessage};
use std::sync::Arc;

use crate::domain::{
    build_concept_annotations_headers, short_name, transaction_id, ConceptAnnotation,
    ConceptAnnotations, MetadataPublishEvent, Whitelist,
};
use crate::error::{MappingError, MappingResult};
use crate::ports::inbound::{MappingOutcome, MessageHandler, SkipReason};
use crate::ports::outbound::OutcomeReporter;

/// Annotation mapper.
///
/// Holds no per-message state, so one instance can serve any number of
/// concurrent `handle_message` calls.
pub struct AnnotationMapperService<P: MessageProducer, R: OutcomeReporter> {
    whitelist: Whitelist,
    producer: Arc<P>,
    reporter: Arc<R>,
}

impl<P: MessageProducer, R: OutcomeReporter> AnnotationMapperService<P, R> {
    /// Create a mapper publishing through `producer`.
    pub fn new(whitelist: Whitelist, producer: Arc<P>, reporter: Arc<R>) -> Self {
        Self {
            whitelist,
            producer,
            reporter,
        }
    }

    /// Whitelist this mapper filters with.
    #[must_use]
    pub fn whitelist(&self) -> &Whitelist {
        &self.whitelist
    }

    /// Map and publish one message, returning what happened to it.
    ///
    /// Unsupported predicates are reported as they are dropped. The overall
    /// outcome is left to the caller.
    pub async fn map_message(&self, message: &RawMessage) -> MappingOutcome {
        if !self.whitelist.is_valid() {
            return MappingOutcome::Skipped(SkipReason::InvalidWhitelist);
        }

        let origin_system_id = message
            .header(headers::ORIGIN_SYSTEM_ID)
            .unwrap_or_default();
        if !self.whitelist.matches(origin_system_id) {
            return MappingOutcome::Skipped(SkipReason::ExcludedSystem {
                origin_system_id: origin_system_id.to_string(),
            });
        }

        match self.map_and_publish(message).await {
            Ok(outcome) => outcome,
            Err(e) => MappingOutcome::Failed(e),
        }
    }

    async fn map_and_publish(&self, message: &RawMessage) -> MappingResult<MappingOutcome> {
        let event: MetadataPublishEvent =
            serde_json::from_str(&message.body).map_err(|e| MappingError::Decode {
                reason: e.to_string(),
            })?;

        let tid = transaction_id(message);
        let total = event.annotations.len();
        let annotations = self.remap(tid, &event);
        let mapped = annotations.len();

        let body = serde_json::to_string(&ConceptAnnotations {
            uuid: event.uuid.clone(),
            annotations,
        })
        .map_err(|e| MappingError::Encode {
            reason: e.to_string(),
        })?;

        let outbound = RawMessage::new(build_concept_annotations_headers(message, Utc::now()), body);
        self.producer.send_message(outbound).await?;

        Ok(MappingOutcome::Delivered {
            uuid: event.uuid,
            mapped,
            dropped: total - mapped,
        })
    }

    fn remap(&self, tid: &str, event: &MetadataPublishEvent) -> Vec<ConceptAnnotation> {
        event
            .annotations
            .iter()
            .filter_map(|annotation| match short_name(&annotation.predicate) {
                Some(name) => Some(ConceptAnnotation::new(annotation.concept_id.clone(), name)),
                None => {
                    self.reporter
                        .unsupported_predicate(tid, &event.uuid, &annotation.predicate);
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl<P, R> MessageHandler for AnnotationMapperService<P, R>
where
    P: MessageProducer + 'static,
    R: OutcomeReporter + 'static,
{
    async fn handle_message(&self, message: RawMessage) {
        let outcome = self.map_message(&message).await;
        self.reporter.record(transaction_id(&message), &outcome);
    }
}
