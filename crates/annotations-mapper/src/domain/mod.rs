//! Domain layer: event shapes, predicate table, header rules, whitelist.

pub mod entities;
pub mod headers;
pub mod predicates;
pub mod whitelist;

pub use entities::{
    ConceptAnnotation, ConceptAnnotations, MetadataAnnotation, MetadataPublishEvent, Thing,
};
pub use headers::{
    build_concept_annotations_headers, format_message_timestamp, transaction_id,
    CONCEPT_ANNOTATION_MESSAGE_TYPE, UNKNOWN_TRANSACTION_ID,
};
pub use predicates::{short_name, PREDICATE_TABLE};
pub use whitelist::Whitelist;
