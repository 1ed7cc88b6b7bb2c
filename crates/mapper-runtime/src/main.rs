//! # PAC Annotations Mapper
//!
//! Reads PAC metadata publish events, keeps those from whitelisted origin
//! systems, maps their predicates to concept annotation short names and
//! publishes the result.
//!
//! Configuration comes from flags or environment variables, see `--help`.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use mapper_runtime::{AppConfig, MapperRuntime, APP_NAME, APP_SYSTEM_CODE};
use mapper_telemetry::init_telemetry;
use queue_transport::InMemoryBroker;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Resolves on SIGINT, or SIGTERM on unix.
async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result,
            _ = terminate.recv() => Ok(()),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::parse();
    config.validate().context("Invalid configuration")?;

    let _telemetry = init_telemetry(config.telemetry()).context("Failed to init telemetry")?;

    info!(
        system_code = APP_SYSTEM_CODE,
        app_name = APP_NAME,
        port = config.port,
        kafka_address = %config.kafka_address,
        "Starting application"
    );

    warn!(
        kafka_address = %config.kafka_address,
        "Using the in-process broker, no external queue will be contacted"
    );
    let broker = Arc::new(InMemoryBroker::new(config.kafka_address.clone()));
    let runtime = MapperRuntime::new(config.clone(), broker);
    runtime.start();

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    let server = runtime.serve(listener);

    shutdown_signal()
        .await
        .context("Failed to listen for shutdown signals")?;
    info!("Shutdown signal received");

    runtime.shutdown().await;
    server
        .await
        .context("HTTP server task failed")?
        .context("HTTP server error")?;

    Ok(())
}
