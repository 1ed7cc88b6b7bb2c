//! # Mapper Runtime Library
//!
//! Wiring for the `pac-annotations-mapper` binary, exposed as a library for
//! testing.
//!
//! ## Startup Sequence
//!
//! 1. Parse configuration (flags, then environment, then defaults)
//! 2. Initialize telemetry
//! 3. Compile the whitelist. An invalid pattern is logged, not fatal
//! 4. Connect the producer and start the consume loop in background tasks
//! 5. Serve `/__health`, `/__gtg`, `/__build-info` and `/metrics`
//! 6. On SIGINT/SIGTERM: stop consuming, close sessions, stop HTTP

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod http;
pub mod runtime;

pub use config::{AppConfig, ConfigError, APP_DESCRIPTION, APP_NAME, APP_SYSTEM_CODE};
pub use http::{router, BuildInfo};
pub use runtime::MapperRuntime;
