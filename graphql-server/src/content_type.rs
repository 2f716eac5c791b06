//! Content negotiation on the request `content-type` header.

/// `content-type` of GraphQL documents sent as the raw body.
pub const APPLICATION_GRAPHQL: &str = "application/graphql";
/// `content-type` of JSON bodies.
pub const APPLICATION_JSON: &str = "application/json";
/// `content-type` of HTML form bodies.
pub const APPLICATION_FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// How a request body should be parsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ContentType {
    Graphql,
    Json,
    Urlencoded,
    Unknown,
}

/// Order matters: the first token found in the header wins.
const RECOGNIZED: [(&str, ContentType); 3] = [
    (APPLICATION_GRAPHQL, ContentType::Graphql),
    (APPLICATION_JSON, ContentType::Json),
    (APPLICATION_FORM_URLENCODED, ContentType::Urlencoded),
];

impl ContentType {
    /// Resolve a `content-type` header value by substring containment, so parameters such as
    /// `; charset=utf-8` do not get in the way.
    pub fn resolve(header_value: Option<&str>) -> ContentType {
        let Some(header_value) = header_value.filter(|value| !value.is_empty()) else {
            return ContentType::Unknown;
        };
        RECOGNIZED
            .iter()
            .find(|(token, _)| header_value.contains(token))
            .map(|(_, content_type)| *content_type)
            .unwrap_or(ContentType::Unknown)
    }
}
