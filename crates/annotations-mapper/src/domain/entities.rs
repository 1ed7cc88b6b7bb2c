//! Inbound and outbound message bodies.

use serde::{Deserialize, Deserializer, Serialize};

/// Metadata publish event read from the inbound topic.
///
/// Unknown fields (such as `submittedBy`) are ignored. Missing or `null`
/// annotations decode as an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MetadataPublishEvent {
    /// Content UUID the annotations belong to.
    pub uuid: String,
    /// Annotations in publication order.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub annotations: Vec<MetadataAnnotation>,
}

/// One PAC annotation.
///
/// Missing fields decode as empty strings, so one incomplete annotation is
/// dropped as unsupported instead of failing the whole event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MetadataAnnotation {
    /// Full predicate URI.
    #[serde(default)]
    pub predicate: String,
    /// Concept the content is annotated with.
    #[serde(default, rename = "id")]
    pub concept_id: String,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Concept annotations written to the outbound topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptAnnotations {
    pub uuid: String,
    pub annotations: Vec<ConceptAnnotation>,
}

/// Wrapper object around a mapped annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptAnnotation {
    pub thing: Thing,
}

/// Concept id plus predicate short name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thing {
    pub id: String,
    pub predicate: String,
}

impl ConceptAnnotation {
    /// Build an annotation for a concept and predicate short name.
    #[must_use]
    pub fn new(concept_id: impl Into<String>, predicate: impl Into<String>) -> Self {
        Self {
            thing: Thing {
                id: concept_id.into(),
                predicate: predicate.into(),
            },
        }
    }
}
