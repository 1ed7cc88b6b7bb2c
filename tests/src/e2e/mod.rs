//! End-to-end flows: a full [`mapper_runtime::MapperRuntime`] over an
//! [`queue_transport::InMemoryBroker`].

pub mod fixtures;

mod mapping;
mod resilience;
