//! Reconnecting producer.

use async_trait::async_trait;
use mapper_telemetry::{metric_inc, TRANSPORT_CONNECT_ATTEMPTS};
use parking_lot::RwLock;
use queue_transport::{
    MessageProducer, RawMessage, TransportConnector, TransportError, TransportResult,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Producer that exists before its queue session does.
///
/// Until [`connect`](Self::connect) succeeds every operation fails with
/// [`TransportError::ProducerNotConnected`]. Nothing is buffered.
pub struct ProxyProducer<C: TransportConnector> {
    connector: Arc<C>,
    topic: String,
    retry_interval: Duration,
    session: RwLock<Option<Arc<C::Producer>>>,
}

impl<C: TransportConnector> ProxyProducer<C> {
    /// Create an unconnected producer for `topic`.
    pub fn new(connector: Arc<C>, topic: impl Into<String>, retry_interval: Duration) -> Self {
        Self {
            connector,
            topic: topic.into(),
            retry_interval,
            session: RwLock::new(None),
        }
    }

    /// Connect, retrying every `retry_interval` until it succeeds.
    ///
    /// Returns immediately if a session already exists.
    pub async fn connect(&self) {
        while !self.is_connected() {
            match self.connector.connect_producer(&self.topic).await {
                Ok(producer) => {
                    metric_inc!(TRANSPORT_CONNECT_ATTEMPTS, &["producer", "success"]);
                    *self.session.write() = Some(Arc::new(producer));
                    info!(
                        address = %self.connector.address(),
                        topic = %self.topic,
                        "Connected to queue producer"
                    );
                }
                Err(e) => {
                    metric_inc!(TRANSPORT_CONNECT_ATTEMPTS, &["producer", "failed"]);
                    warn!(
                        address = %self.connector.address(),
                        error = %e,
                        retry_in_secs = self.retry_interval.as_secs(),
                        "Error creating queue producer"
                    );
                    tokio::time::sleep(self.retry_interval).await;
                }
            }
        }
    }

    /// Whether a session exists.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.session.read().is_some()
    }

    fn session(&self) -> TransportResult<Arc<C::Producer>> {
        self.session
            .read()
            .clone()
            .ok_or(TransportError::ProducerNotConnected)
    }
}

#[async_trait]
impl<C: TransportConnector> MessageProducer for ProxyProducer<C> {
    async fn send_message(&self, message: RawMessage) -> TransportResult<()> {
        self.session()?.send_message(message).await
    }

    async fn connectivity_check(&self) -> TransportResult<()> {
        self.session()?.connectivity_check().await
    }

    async fn close(&self) -> TransportResult<()> {
        let session = self.session.write().take();
        match session {
            Some(producer) => producer.close().await,
            None => Ok(()),
        }
    }
}
