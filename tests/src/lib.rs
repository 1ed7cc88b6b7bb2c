//! # PAC Annotations Mapper Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── e2e/
//!     ├── fixtures.rs     # Broker, runtime and message builders
//!     ├── mapping.rs      # Inbound event → outbound concept annotations
//!     └── resilience.rs   # Queue outages, publish failures, health
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p mapper-tests
//! cargo test -p mapper-tests e2e::resilience::
//! ```

#![allow(dead_code)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod e2e;
