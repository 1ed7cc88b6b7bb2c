//! # Health Checks
//!
//! Health and good-to-go reporting for the mapper.
//!
//! ## Checks
//!
//! | Id | Severity | Present |
//! |----|----------|---------|
//! | `message-whitelist` | 2 | only while the whitelist pattern is invalid |
//! | `read-message-queue-reachable` | 2 | always |
//! | `write-message-queue-reachable` | 2 | always |
//! | `consumer-lag` | 3 | when a lag tolerance is configured |
//!
//! Good-to-go only looks at queue connectivity, and stops at the first failure.

use chrono::{DateTime, Utc};
use futures::future::{join_all, try_join};
use queue_transport::{MessageConsumer, MessageProducer, TransportResult};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::Whitelist;

/// Runbook linked from every check.
pub const PANIC_GUIDE: &str = "https://dewey.ft.com/pac-annotations-mapper.html";

/// Upper bound on a single check.
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

const CONNECTED_OUTPUT: &str = "Successfully connected to queue";
const CONNECT_ERROR_OUTPUT: &str = "Error connecting to queue";

/// Identity reported at the top of the health report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    pub system_code: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Checker {
    Whitelist,
    ReadQueue,
    WriteQueue,
    ConsumerLag(u64),
}

/// A health check definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub id: &'static str,
    pub name: &'static str,
    pub severity: u8,
    pub business_impact: &'static str,
    pub technical_summary: String,
    pub panic_guide: &'static str,
    checker: Checker,
}

/// Outcome of one check, in the FT health check format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub id: String,
    pub name: String,
    pub ok: bool,
    pub severity: u8,
    pub business_impact: String,
    pub technical_summary: String,
    pub panic_guide: String,
    pub check_output: String,
    pub last_updated: DateTime<Utc>,
}

/// Aggregated health report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub schema_version: u8,
    pub system_code: String,
    pub name: String,
    pub description: String,
    pub checks: Vec<CheckResult>,
    pub ok: bool,
}

impl HealthReport {
    /// Result of the check with `id`, if it ran.
    #[must_use]
    pub fn check(&self, id: &str) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.id == id)
    }
}

/// Good-to-go decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GtgStatus {
    pub good_to_go: bool,
    pub message: String,
}

impl GtgStatus {
    fn ok() -> Self {
        Self {
            good_to_go: true,
            message: "OK".to_string(),
        }
    }

    fn not_ok(message: impl Into<String>) -> Self {
        Self {
            good_to_go: false,
            message: message.into(),
        }
    }
}

/// Runs the mapper's health and good-to-go checks.
pub struct HealthService {
    info: ServiceInfo,
    whitelist_error: Option<String>,
    consumer: Arc<dyn MessageConsumer>,
    producer: Arc<dyn MessageProducer>,
    lag_tolerance: Option<u64>,
    check_timeout: Duration,
}

impl HealthService {
    /// Create a health service over the mapper's queue sessions.
    pub fn new(
        info: ServiceInfo,
        whitelist: &Whitelist,
        consumer: Arc<dyn MessageConsumer>,
        producer: Arc<dyn MessageProducer>,
    ) -> Self {
        Self {
            info,
            whitelist_error: whitelist.error().map(str::to_string),
            consumer,
            producer,
            lag_tolerance: None,
            check_timeout: DEFAULT_CHECK_TIMEOUT,
        }
    }

    /// Add the consumer lag check.
    #[must_use]
    pub fn with_lag_tolerance(mut self, tolerance: u64) -> Self {
        self.lag_tolerance = Some(tolerance);
        self
    }

    /// Override the per-check timeout.
    #[must_use]
    pub fn with_check_timeout(mut self, timeout: Duration) -> Self {
        self.check_timeout = timeout;
        self
    }

    #[must_use]
    pub fn info(&self) -> &ServiceInfo {
        &self.info
    }

    /// Checks that currently apply, in report order.
    #[must_use]
    pub fn checks(&self) -> Vec<Check> {
        let mut checks = Vec::with_capacity(4);

        if let Some(error) = &self.whitelist_error {
            checks.push(Check {
                id: "message-whitelist",
                name: "Message Whitelist Filter",
                severity: 2,
                business_impact: "No metadata will be mapped to UPP. This will negatively impact metadata availability.",
                technical_summary: format!(
                    "The whitelist configuration for this mapper is invalid: {error}"
                ),
                panic_guide: PANIC_GUIDE,
                checker: Checker::Whitelist,
            });
        }

        checks.push(Check {
            id: "read-message-queue-reachable",
            name: "Read Message Queue Reachable",
            severity: 2,
            business_impact: "PAC annotations will not be read from the queue",
            technical_summary: "Read message queue is not reachable/healthy".to_string(),
            panic_guide: PANIC_GUIDE,
            checker: Checker::ReadQueue,
        });
        checks.push(Check {
            id: "write-message-queue-reachable",
            name: "Write Message Queue Reachable",
            severity: 2,
            business_impact: "Concept annotations will not be written to the queue",
            technical_summary: "Write message queue is not reachable/healthy".to_string(),
            panic_guide: PANIC_GUIDE,
            checker: Checker::WriteQueue,
        });

        if let Some(tolerance) = self.lag_tolerance {
            checks.push(Check {
                id: "consumer-lag",
                name: "Consumer is keeping up with the queue",
                severity: 3,
                business_impact: "PAC annotations will reach the knowledge graph with a delay",
                technical_summary: format!(
                    "Messages awaiting handling exceed the configured tolerance of {tolerance}"
                ),
                panic_guide: PANIC_GUIDE,
                checker: Checker::ConsumerLag(tolerance),
            });
        }

        checks
    }

    /// Run every check concurrently and build the report.
    pub async fn run_checks(&self) -> HealthReport {
        let checks = self.checks();
        let outputs = join_all(checks.iter().map(|check| self.run_check(check.checker))).await;

        let results: Vec<CheckResult> = checks
            .into_iter()
            .zip(outputs)
            .map(|(check, output)| {
                let (ok, check_output) = match output {
                    Ok(output) => (true, output),
                    Err(output) => (false, output),
                };
                CheckResult {
                    id: check.id.to_string(),
                    name: check.name.to_string(),
                    ok,
                    severity: check.severity,
                    business_impact: check.business_impact.to_string(),
                    technical_summary: check.technical_summary,
                    panic_guide: check.panic_guide.to_string(),
                    check_output,
                    last_updated: Utc::now(),
                }
            })
            .collect();

        HealthReport {
            schema_version: 1,
            system_code: self.info.system_code.clone(),
            name: self.info.name.clone(),
            description: self.info.description.clone(),
            ok: results.iter().all(|r| r.ok),
            checks: results,
        }
    }

    /// Consumer and producer connectivity, run in parallel.
    ///
    /// Returns as soon as either fails.
    pub async fn gtg(&self) -> GtgStatus {
        let consumer = self.bounded(self.consumer.connectivity_check());
        let producer = self.bounded(self.producer.connectivity_check());

        match try_join(consumer, producer).await {
            Ok(_) => GtgStatus::ok(),
            Err(e) => GtgStatus::not_ok(e),
        }
    }

    async fn run_check(&self, checker: Checker) -> Result<String, String> {
        match checker {
            Checker::Whitelist => Err(self
                .whitelist_error
                .clone()
                .unwrap_or_else(|| "whitelist regex is invalid".to_string())),
            Checker::ReadQueue => self
                .bounded(self.consumer.connectivity_check())
                .await
                .map(|()| CONNECTED_OUTPUT.to_string()),
            Checker::WriteQueue => self
                .bounded(self.producer.connectivity_check())
                .await
                .map(|()| CONNECTED_OUTPUT.to_string()),
            Checker::ConsumerLag(tolerance) => self
                .bounded(self.consumer.monitor_check(tolerance))
                .await
                .map(|()| format!("Consumer lag is within the tolerance of {tolerance}")),
        }
    }

    async fn bounded<F>(&self, check: F) -> Result<(), String>
    where
        F: Future<Output = TransportResult<()>>,
    {
        match tokio::time::timeout(self.check_timeout, check).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(format!("{CONNECT_ERROR_OUTPUT}: {e}")),
            Err(_) => Err(format!(
                "{CONNECT_ERROR_OUTPUT}: check timed out after {}s",
                self.check_timeout.as_secs()
            )),
        }
    }
}
