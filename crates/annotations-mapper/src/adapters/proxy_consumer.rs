//! Reconnecting consumer and the consume loop.

use async_trait::async_trait;
use mapper_telemetry::{
    metric_inc, time_histogram, MESSAGE_HANDLING_DURATION, TRANSPORT_CONNECT_ATTEMPTS,
};
use parking_lot::RwLock;
use queue_transport::{
    MessageConsumer, RawMessage, TransportConnector, TransportError, TransportResult,
    HEALTHCHECK_GROUP_SUFFIX,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::ports::inbound::MessageHandler;

/// Consumer that exists before its queue session does.
///
/// Until [`connect`](Self::connect) succeeds every operation fails with
/// [`TransportError::ConsumerNotConnected`].
pub struct ProxyConsumer<C: TransportConnector> {
    connector: Arc<C>,
    group: String,
    topics: Vec<String>,
    retry_interval: Duration,
    session: RwLock<Option<Arc<C::Consumer>>>,
}

impl<C: TransportConnector> ProxyConsumer<C> {
    /// Create an unconnected consumer for `topics` in `group`.
    pub fn new(
        connector: Arc<C>,
        group: impl Into<String>,
        topics: Vec<String>,
        retry_interval: Duration,
    ) -> Self {
        Self {
            connector,
            group: group.into(),
            topics,
            retry_interval,
            session: RwLock::new(None),
        }
    }

    /// Connect, retrying every `retry_interval` until it succeeds.
    ///
    /// Returns immediately if a session already exists.
    pub async fn connect(&self) {
        while !self.is_connected() {
            match self
                .connector
                .connect_consumer(&self.group, &self.topics)
                .await
            {
                Ok(consumer) => {
                    metric_inc!(TRANSPORT_CONNECT_ATTEMPTS, &["consumer", "success"]);
                    *self.session.write() = Some(Arc::new(consumer));
                    info!(
                        address = %self.connector.address(),
                        group = %self.group,
                        topics = ?self.topics,
                        "Connected to queue consumer"
                    );
                }
                Err(e) => {
                    metric_inc!(TRANSPORT_CONNECT_ATTEMPTS, &["consumer", "failed"]);
                    warn!(
                        address = %self.connector.address(),
                        error = %e,
                        retry_in_secs = self.retry_interval.as_secs(),
                        "Error creating queue consumer"
                    );
                    tokio::time::sleep(self.retry_interval).await;
                }
            }
        }
    }

    /// Connect if needed, then feed every message to `handler` until the
    /// session closes or `shutdown` turns true.
    ///
    /// Messages are handled one at a time. Shutdown is only observed between
    /// messages, so a message being handled is never cut short.
    pub async fn start_listening<H>(&self, handler: &H, mut shutdown: watch::Receiver<bool>)
    where
        H: MessageHandler + ?Sized,
    {
        tokio::select! {
            _ = self.connect() => {}
            _ = shutdown_requested(&mut shutdown) => {
                info!("Shutdown requested before the consumer connected");
                return;
            }
        }

        info!(group = %self.group, "Starting to consume messages");

        loop {
            // Closed concurrently by `close()`
            let Ok(session) = self.session() else {
                break;
            };

            let next = tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => break,
                next = session.next_message() => next,
            };

            match next {
                Ok(Some(message)) => {
                    let _timer = time_histogram!(MESSAGE_HANDLING_DURATION);
                    handler.handle_message(message).await;
                }
                Ok(None) => {
                    info!(group = %self.group, "Consumer session closed");
                    break;
                }
                Err(e) => {
                    error!(group = %self.group, error = %e, "Error reading from queue");
                    tokio::select! {
                        _ = tokio::time::sleep(self.retry_interval) => {}
                        _ = shutdown_requested(&mut shutdown) => break,
                    }
                }
            }
        }

        info!(group = %self.group, "Stopped consuming messages");
    }

    /// Whether a session exists.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.session.read().is_some()
    }

    fn session(&self) -> TransportResult<Arc<C::Consumer>> {
        self.session
            .read()
            .clone()
            .ok_or(TransportError::ConsumerNotConnected)
    }
}

/// Resolves once the flag is true or the sender is gone.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

#[async_trait]
impl<C: TransportConnector> MessageConsumer for ProxyConsumer<C> {
    async fn next_message(&self) -> TransportResult<Option<RawMessage>> {
        self.session()?.next_message().await
    }

    /// Opens a short-lived probe session in `<group>-healthcheck`, so the
    /// main session's offsets are left alone.
    async fn connectivity_check(&self) -> TransportResult<()> {
        self.session()?;

        let probe_group = format!("{}{}", self.group, HEALTHCHECK_GROUP_SUFFIX);
        let probe = self
            .connector
            .connect_consumer(&probe_group, &self.topics)
            .await?;

        let result = probe.connectivity_check().await;
        if let Err(e) = probe.close().await {
            debug!(group = %probe_group, error = %e, "Error closing healthcheck consumer");
        }
        result
    }

    async fn monitor_check(&self, tolerance: u64) -> TransportResult<()> {
        self.session()?.monitor_check(tolerance).await
    }

    async fn close(&self) -> TransportResult<()> {
        let session = self.session.write().take();
        match session {
            Some(consumer) => consumer.close().await,
            None => Ok(()),
        }
    }
}
