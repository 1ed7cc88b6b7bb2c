//! PAC predicate URIs and the concept annotation short names they map to.

/// Supported predicates as `(uri, short_name)` pairs.
pub const PREDICATE_TABLE: [(&str, &str); 8] = [
    ("http://www.ft.com/ontology/hasBrand", "hasBrand"),
    (
        "http://www.ft.com/ontology/classification/isClassifiedBy",
        "isClassifiedBy",
    ),
    (
        "http://www.ft.com/ontology/implicitlyClassifiedBy",
        "implicitlyClassifiedBy",
    ),
    ("http://www.ft.com/ontology/annotation/hasAuthor", "hasAuthor"),
    ("http://www.ft.com/ontology/hasContributor", "hasContributor"),
    ("http://www.ft.com/ontology/annotation/about", "about"),
    ("http://www.ft.com/ontology/hasDisplayTag", "hasDisplayTag"),
    ("http://www.ft.com/ontology/annotation/mentions", "mentions"),
];

/// Short name for a predicate URI, or `None` if the predicate is unsupported.
///
/// Exact, case-sensitive match on the full URI.
#[must_use]
pub fn short_name(predicate_uri: &str) -> Option<&'static str> {
    PREDICATE_TABLE
        .iter()
        .find(|(uri, _)| *uri == predicate_uri)
        .map(|(_, name)| *name)
}
