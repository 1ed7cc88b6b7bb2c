//! Shared fixtures for end-to-end flows.

use std::sync::Arc;
use std::time::Duration;

use annotations_mapper::ConceptAnnotations;
use mapper_runtime::{AppConfig, MapperRuntime};
use mapper_telemetry::MESSAGES_FAILED;
use queue_transport::{
    headers, InMemoryBroker, MemoryConsumer, MessageConsumer, RawMessage, TransportConnector,
};
use tokio::time::timeout;

pub const IN_TOPIC: &str = "NativeCmsMetadataPublicationEvents";
pub const OUT_TOPIC: &str = "ConceptAnnotations";
pub const GROUP: &str = "pac-annotations-mapper";
pub const PAC_ORIGIN: &str = "http://cmdb.ft.com/systems/pac";
pub const MENTIONS: &str = "http://www.ft.com/ontology/annotation/mentions";
pub const ABOUT: &str = "http://www.ft.com/ontology/annotation/about";

const WAIT: Duration = Duration::from_secs(5);

/// A runtime wired to its own broker, plus a reader on the outbound topic.
pub struct Harness {
    pub broker: Arc<InMemoryBroker>,
    pub runtime: MapperRuntime<InMemoryBroker>,
    pub reader: MemoryConsumer,
}

impl Harness {
    /// Build with default config and a 1s connect backoff. Not started.
    pub async fn new() -> Self {
        Self::with_config(AppConfig {
            connect_backoff_secs: 1,
            ..AppConfig::default()
        })
        .await
    }

    pub async fn with_config(config: AppConfig) -> Self {
        let broker = Arc::new(InMemoryBroker::new(config.kafka_address.clone()));
        // Subscribe before anything is published so every output is seen
        let reader = broker
            .connect_consumer("e2e-reader", &[OUT_TOPIC.to_string()])
            .await
            .expect("reader connect");
        let runtime = MapperRuntime::new(config, Arc::clone(&broker));

        Self {
            broker,
            runtime,
            reader,
        }
    }

    /// Start the runtime and wait for both sessions.
    pub async fn start(&self) {
        self.runtime.start();
        self.wait_connected().await;
    }

    pub async fn wait_connected(&self) {
        timeout(WAIT, async {
            while !self.runtime.is_connected() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("runtime did not connect");
    }

    /// Publish an inbound message.
    pub fn publish(&self, message: RawMessage) {
        self.broker.publish(IN_TOPIC, message).expect("publish");
    }

    /// Next outbound message.
    pub async fn next_output(&self) -> RawMessage {
        timeout(WAIT, self.reader.next_message())
            .await
            .expect("no outbound message")
            .expect("reader error")
            .expect("reader closed")
    }

    /// Decode the next outbound body.
    pub async fn next_annotations(&self) -> (RawMessage, ConceptAnnotations) {
        let message = self.next_output().await;
        let body = serde_json::from_str(&message.body).expect("outbound body is JSON");
        (message, body)
    }

    /// Wait until the mapper group has read everything published so far.
    pub async fn wait_drained(&self) {
        timeout(WAIT, async {
            while self.broker.lag(GROUP, IN_TOPIC) > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("mapper did not drain the inbound topic");
    }

    /// Wait until at least one more message has failed at `stage`.
    pub async fn wait_failed(&self, stage: &str, before: f64) {
        timeout(WAIT, async {
            while MESSAGES_FAILED.with_label_values(&[stage]).get() <= before {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("no failure recorded");
    }

    pub fn outputs_published(&self) -> u64 {
        self.broker.end_offset(OUT_TOPIC)
    }
}

/// Inbound message with the usual PAC headers.
pub fn inbound(tid: &str, origin: &str, body: impl Into<String>) -> RawMessage {
    RawMessage::new(Default::default(), body)
        .with_header(headers::REQUEST_ID, tid)
        .with_header(headers::ORIGIN_SYSTEM_ID, origin)
        .with_header(headers::CONTENT_TYPE, "application/json")
}

/// Metadata publish event body for `(predicate, concept id)` pairs.
pub fn event_body(uuid: &str, annotations: &[(&str, &str)]) -> String {
    let annotations: Vec<_> = annotations
        .iter()
        .map(|(predicate, id)| serde_json::json!({ "predicate": predicate, "id": id }))
        .collect();
    serde_json::json!({
        "uuid": uuid,
        "submittedBy": "e2e",
        "annotations": annotations,
    })
    .to_string()
}
