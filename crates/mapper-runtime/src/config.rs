//! # Mapper Configuration
//!
//! Command line flags with environment variable fallbacks.

use annotations_mapper::ServiceInfo;
use clap::Parser;
use mapper_telemetry::TelemetryConfig;
use std::time::Duration;
use thiserror::Error;

/// System code reported by the health endpoint.
pub const APP_SYSTEM_CODE: &str = "pac-annotations-mapper";
/// Human readable application name.
pub const APP_NAME: &str = "PAC Annotations Mapper";
/// Application description.
pub const APP_DESCRIPTION: &str = "UPP mapper for PAC annotations";

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_KAFKA_ADDRESS: &str = "kafka:9092";
pub const DEFAULT_CONSUMER_GROUP: &str = "pac-annotations-mapper";
pub const DEFAULT_CONSUMER_TOPIC: &str = "NativeCmsMetadataPublicationEvents";
pub const DEFAULT_PRODUCER_TOPIC: &str = "ConceptAnnotations";
pub const DEFAULT_WHITELIST_REGEX: &str = r"http://cmdb\.ft\.com/systems/pac";
pub const DEFAULT_LAG_TOLERANCE: u64 = 200;
pub const DEFAULT_CONNECT_BACKOFF_SECS: u64 = 60;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required name was empty.
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    /// Port 0 would bind a random port.
    #[error("port must be non-zero")]
    ZeroPort,

    /// A zero backoff would spin on connect failures.
    #[error("connect backoff must be at least one second")]
    ZeroBackoff,
}

/// Complete mapper configuration.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = APP_SYSTEM_CODE)]
#[command(version, about = APP_DESCRIPTION, long_about = None)]
pub struct AppConfig {
    /// Port to listen on
    #[arg(long, env = "APP_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Logging level or filter directive
    #[arg(long, env = "LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    /// Emit JSON log lines
    #[arg(long, env = "JSON_LOGS")]
    pub json_logs: bool,

    /// Queue address. The binary runs against its in-process broker, so this
    /// only labels logs and the broker; no external queue is contacted.
    #[arg(long, env = "KAFKA_ADDRESS", default_value = DEFAULT_KAFKA_ADDRESS)]
    pub kafka_address: String,

    /// Consumer group id
    #[arg(long, env = "CONSUMER_GROUP", default_value = DEFAULT_CONSUMER_GROUP)]
    pub consumer_group: String,

    /// Topic to read metadata publish events from
    #[arg(long, env = "CONSUMER_TOPIC", default_value = DEFAULT_CONSUMER_TOPIC)]
    pub consumer_topic: String,

    /// Topic to write concept annotations to
    #[arg(long, env = "PRODUCER_TOPIC", default_value = DEFAULT_PRODUCER_TOPIC)]
    pub producer_topic: String,

    /// Regex an Origin-System-Id must match for its message to be mapped
    #[arg(long, env = "WHITELIST_REGEX", default_value = DEFAULT_WHITELIST_REGEX)]
    pub whitelist_regex: String,

    /// Consumer lag, in messages, above which the lag check fails
    #[arg(long, env = "KAFKA_LAG_TOLERANCE", default_value_t = DEFAULT_LAG_TOLERANCE)]
    pub kafka_lag_tolerance: u64,

    /// Seconds to wait between queue connect attempts
    #[arg(long, env = "CONNECT_BACKOFF_SECS", default_value_t = DEFAULT_CONNECT_BACKOFF_SECS)]
    pub connect_backoff_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            json_logs: false,
            kafka_address: DEFAULT_KAFKA_ADDRESS.to_string(),
            consumer_group: DEFAULT_CONSUMER_GROUP.to_string(),
            consumer_topic: DEFAULT_CONSUMER_TOPIC.to_string(),
            producer_topic: DEFAULT_PRODUCER_TOPIC.to_string(),
            whitelist_regex: DEFAULT_WHITELIST_REGEX.to_string(),
            kafka_lag_tolerance: DEFAULT_LAG_TOLERANCE,
            connect_backoff_secs: DEFAULT_CONNECT_BACKOFF_SECS,
        }
    }
}

impl AppConfig {
    /// Reject values the service cannot run with.
    ///
    /// The whitelist is not checked here: an invalid pattern is reported
    /// through the health endpoint instead.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::ZeroPort);
        }
        if self.connect_backoff_secs == 0 {
            return Err(ConfigError::ZeroBackoff);
        }

        let required = [
            ("kafka-address", &self.kafka_address),
            ("consumer-group", &self.consumer_group),
            ("consumer-topic", &self.consumer_topic),
            ("producer-topic", &self.producer_topic),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Empty { field });
            }
        }
        Ok(())
    }

    /// Wait between queue connect attempts.
    #[must_use]
    pub fn connect_backoff(&self) -> Duration {
        Duration::from_secs(self.connect_backoff_secs)
    }

    /// Logging configuration.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryConfig {
        TelemetryConfig::for_service(APP_SYSTEM_CODE, &self.log_level, self.json_logs)
    }

    /// Identity for the health report.
    #[must_use]
    pub fn service_info(&self) -> ServiceInfo {
        ServiceInfo {
            system_code: APP_SYSTEM_CODE.to_string(),
            name: APP_NAME.to_string(),
            description: APP_DESCRIPTION.to_string(),
        }
    }
}
