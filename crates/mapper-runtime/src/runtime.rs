//! # Mapper Runtime
//!
//! Owns the queue proxies, the mapper and the health service, and the
//! background tasks that drive them.

use annotations_mapper::{
    AnnotationMapperService, HealthService, ProxyConsumer, ProxyProducer, TracingReporter,
    Whitelist,
};
use axum::Router;
use parking_lot::Mutex;
use queue_transport::{MessageConsumer, MessageProducer, TransportConnector};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::http;

/// How long shutdown waits for each background task.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

type Mapper<C> = AnnotationMapperService<ProxyProducer<C>, TracingReporter>;

/// The running mapper.
pub struct MapperRuntime<C: TransportConnector + 'static> {
    config: AppConfig,
    producer: Arc<ProxyProducer<C>>,
    consumer: Arc<ProxyConsumer<C>>,
    mapper: Arc<Mapper<C>>,
    health: Arc<HealthService>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<C: TransportConnector + 'static> MapperRuntime<C> {
    /// Wire the mapper against `connector`. Nothing connects until [`start`](Self::start).
    pub fn new(config: AppConfig, connector: Arc<C>) -> Self {
        let whitelist = Whitelist::compile(&config.whitelist_regex);
        if let Some(e) = whitelist.error() {
            error!(
                whitelist_regex = %config.whitelist_regex,
                error = %e,
                "Whitelist regex is invalid, no messages will be mapped"
            );
        }

        let producer = Arc::new(ProxyProducer::new(
            Arc::clone(&connector),
            config.producer_topic.clone(),
            config.connect_backoff(),
        ));
        let consumer = Arc::new(ProxyConsumer::new(
            connector,
            config.consumer_group.clone(),
            vec![config.consumer_topic.clone()],
            config.connect_backoff(),
        ));

        let mapper = Arc::new(AnnotationMapperService::new(
            whitelist.clone(),
            Arc::clone(&producer),
            Arc::new(TracingReporter),
        ));

        let health_consumer: Arc<dyn MessageConsumer> = consumer.clone();
        let health_producer: Arc<dyn MessageProducer> = producer.clone();
        let health = Arc::new(
            HealthService::new(
                config.service_info(),
                &whitelist,
                health_consumer,
                health_producer,
            )
            .with_lag_tolerance(config.kafka_lag_tolerance),
        );

        let (shutdown_tx, _) = watch::channel(false);

        Self {
            config,
            producer,
            consumer,
            mapper,
            health,
            shutdown_tx,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Connect the producer and start consuming, both in the background.
    pub fn start(&self) {
        info!(
            consumer_topic = %self.config.consumer_topic,
            producer_topic = %self.config.producer_topic,
            consumer_group = %self.config.consumer_group,
            "Starting annotations mapper"
        );

        let producer = Arc::clone(&self.producer);
        let producer_shutdown = self.shutdown_tx.subscribe();
        let producer_task = tokio::spawn(async move {
            tokio::select! {
                _ = producer.connect() => {}
                _ = stopped(producer_shutdown) => {
                    info!("Shutdown requested before the producer connected");
                }
            }
        });

        let consumer = Arc::clone(&self.consumer);
        let mapper = Arc::clone(&self.mapper);
        let consumer_shutdown = self.shutdown_tx.subscribe();
        let consumer_task = tokio::spawn(async move {
            consumer
                .start_listening(mapper.as_ref(), consumer_shutdown)
                .await;
        });

        self.tasks.lock().extend([producer_task, consumer_task]);
    }

    /// Admin router over this runtime's health service.
    pub fn router(&self) -> Router {
        http::router(Arc::clone(&self.health))
    }

    /// Serve the admin endpoints until shutdown.
    pub fn serve(&self, listener: TcpListener) -> JoinHandle<std::io::Result<()>> {
        let router = self.router();
        let shutdown = self.shutdown_tx.subscribe();

        if let Ok(addr) = listener.local_addr() {
            info!(addr = %addr, "Serving admin endpoints");
        }

        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(stopped(shutdown))
                .await
        })
    }

    /// Stop consuming, close both sessions and wait for background tasks.
    ///
    /// A message being mapped when shutdown starts may be lost.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        self.shutdown_tx.send_replace(true);

        if let Err(e) = self.consumer.close().await {
            warn!(error = %e, "Error closing consumer");
        }
        if let Err(e) = self.producer.close().await {
            warn!(error = %e, "Error closing producer");
        }

        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if tokio::time::timeout(SHUTDOWN_GRACE, task).await.is_err() {
                warn!("Background task did not stop in time");
            }
        }

        info!("Shutdown complete");
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn health(&self) -> Arc<HealthService> {
        Arc::clone(&self.health)
    }

    /// Whether both queue sessions are up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.producer.is_connected() && self.consumer.is_connected()
    }

    #[must_use]
    pub fn whitelist(&self) -> &Whitelist {
        self.mapper.whitelist()
    }
}

/// Resolves once shutdown is signalled or the sender is gone.
async fn stopped(mut shutdown: watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
