//! # annotations-mapper
//!
//! Maps PAC metadata publish events to UPP concept annotations.
//!
//! ## Overview
//!
//! This crate provides:
//! - **Whitelist filter**: only events whose `Origin-System-Id` matches the
//!   configured pattern are processed
//! - **Predicate table**: PAC predicate URIs mapped to concept annotation short names
//! - **Mapper service**: decode → remap → encode → publish, one message at a time
//! - **Proxy producer/consumer**: hide queue outages behind a fixed-interval reconnect loop
//! - **Health checks**: whitelist validity, queue connectivity and consumer lag
//!
//! ## Pipeline
//!
//! ```text
//! ProxyConsumer ──RawMessage──→ AnnotationMapperService ──RawMessage──→ ProxyProducer
//!                                   │
//!                                   ├── Origin-System-Id not whitelisted → skipped
//!                                   ├── body not JSON                    → failed (dropped)
//!                                   └── unknown predicate                → annotation dropped
//! ```
//!
//! ## Delivery
//!
//! At-most-once. A message that fails to decode, encode or publish is logged
//! with its transaction id and dropped. Nothing is retried at this layer.
//!
//! ## Example
//!
//! ```rust,ignore
//! use annotations_mapper::{AnnotationMapperService, TracingReporter, Whitelist};
//! use annotations_mapper::ports::inbound::MessageHandler;
//!
//! let whitelist = Whitelist::compile(r"http://cmdb\.ft\.com/systems/pac");
//! let mapper = AnnotationMapperService::new(whitelist, producer, Arc::new(TracingReporter));
//!
//! mapper.handle_message(message).await;
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod error;
pub mod health;
pub mod ports;
pub mod service;

pub use adapters::{ProxyConsumer, ProxyProducer, TracingReporter, DEFAULT_RETRY_INTERVAL};
pub use domain::{
    short_name, ConceptAnnotation, ConceptAnnotations, MetadataAnnotation, MetadataPublishEvent,
    Thing, Whitelist, PREDICATE_TABLE,
};
pub use error::{MappingError, MappingResult};
pub use health::{Check, CheckResult, GtgStatus, HealthReport, HealthService, ServiceInfo};
pub use ports::inbound::{MappingOutcome, MessageHandler, SkipReason};
pub use ports::outbound::OutcomeReporter;
pub use service::AnnotationMapperService;
