//! Ports (hexagonal boundaries).
//!
//! - `inbound`: how the consume loop drives the mapper
//! - `outbound`: where per-message outcomes are reported

pub mod inbound;
pub mod outbound;
