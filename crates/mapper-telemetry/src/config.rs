//! Telemetry configuration.

/// Default service name in log lines.
pub const DEFAULT_SERVICE_NAME: &str = "pac-annotations-mapper";

/// Configuration for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to the startup log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full directive
    pub log_level: String,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Configuration for a named service with an explicit level and format.
    pub fn for_service(service_name: &str, log_level: &str, json_logs: bool) -> Self {
        Self {
            service_name: service_name.to_string(),
            log_level: log_level.to_string(),
            json_logs,
            ..Self::default()
        }
    }
}
