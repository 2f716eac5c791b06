//! Types related to GraphQL requests, responses, etc.

mod request;
mod response;

use std::fmt;

pub use request::Request;
pub use response::Response;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map as JsonMap;
use serde_json::Value;

/// A JSON object, as used for `variables` and `extensions`.
pub type Object = JsonMap<String, Value>;

/// The name reported for errors produced by the GraphQL engine.
pub const GRAPHQL_ERROR_NAME: &str = "GraphQLError";

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
/// The error location
pub struct Location {
    /// The line number
    pub line: u32,
    /// The column number
    pub column: u32,
}

/// The GraphQL document an error was raised against.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Source {
    /// Full text of the document.
    pub body: String,
    /// Name of the document, `GraphQL request` if the engine does not name it.
    pub name: String,
}

impl Source {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            name: "GraphQL request".to_string(),
        }
    }
}

/// A [GraphQL error](https://spec.graphql.org/October2021/#sec-Errors)
/// as may be found in the `errors` field of a GraphQL [`Response`].
///
/// Only `message`, `locations`, `path` and `extensions` are serialized. The remaining fields are
/// diagnostics the engine may attach and are only used when the error is logged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[non_exhaustive]
pub struct Error {
    /// The error message.
    pub message: String,

    /// The locations of the error in the GraphQL document of the originating request.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,

    /// If this is a field error, the JSON path to that field in [`Response::data`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Value>>,

    /// The optional GraphQL extensions for this error.
    #[serde(skip_serializing_if = "Object::is_empty")]
    pub extensions: Object,

    /// The document the error was raised against.
    #[serde(skip)]
    pub source: Option<Source>,

    /// The AST nodes the error relates to, as the engine chose to represent them.
    #[serde(skip)]
    pub nodes: Option<Value>,

    /// Backtrace or cause chain captured when the error was created.
    #[serde(skip)]
    pub stack: Option<String>,
}

#[buildstructor::buildstructor]
impl Error {
    /// Returns a builder that builds a GraphQL [`Error`] from its components.
    ///
    /// Builder methods:
    ///
    /// * `.message(impl Into<`[`String`]`>)`
    ///   Required.
    ///   Sets [`Error::message`].
    ///
    /// * `.location(impl Into<`[`Location`]`>)`
    ///   Optional, may be called multiple times.
    ///   Adds one item at the end of [`Error::locations`].
    ///
    /// * `.extension(impl Into<`[`String`]`>, impl Into<`[`Value`]`>)`
    ///   Optional, may be called multiple times.
    ///   Adds one item to the [`Error::extensions`] map.
    ///
    /// * `.extension_code(impl Into<`[`String`]`>)`
    ///   Optional.
    ///   Sets the "code" in the extension map. Will be ignored if extension already has this key
    ///   set.
    ///
    /// * `.source(impl Into<`[`Source`]`>)`, `.nodes(impl Into<`[`Value`]`>)`,
    ///   `.stack(impl Into<`[`String`]`>)`
    ///   Optional diagnostics, never serialized.
    ///
    /// * `.build()`
    ///   Finishes the builder and returns a GraphQL [`Error`].
    #[builder(visibility = "pub")]
    fn new(
        message: String,
        locations: Vec<Location>,
        path: Option<Vec<Value>>,
        extension_code: Option<String>,
        // Skip the `Object` type alias in order to use buildstructor's map special-casing
        mut extensions: JsonMap<String, Value>,
        source: Option<Source>,
        nodes: Option<Value>,
        stack: Option<String>,
    ) -> Self {
        if let Some(code) = extension_code {
            extensions
                .entry("code")
                .or_insert(Value::String(code));
        }
        Self {
            message,
            locations,
            path,
            extensions,
            source,
            nodes,
            stack,
        }
    }
}

impl Error {
    /// Name used as `errorName` when the error is logged.
    pub fn name(&self) -> &'static str {
        GRAPHQL_ERROR_NAME
    }

    /// Extract the error code from [`Error::extensions`] as a String if it is set.
    pub fn extension_code(&self) -> Option<String> {
        self.extensions.get("code").and_then(|c| match c {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) | Value::Bool(_) => None,
        })
    }

    /// The service that raised this error, if it came from a remote dependency.
    pub fn service_name(&self) -> Option<&str> {
        self.extensions.get("serviceName").and_then(Value::as_str)
    }

    /// The query text attached to the error, looked up in `extensions.query`, then
    /// `source.body`, then the serialized `nodes`.
    pub fn query(&self) -> Option<String> {
        if let Some(query) = self.extensions.get("query").and_then(Value::as_str) {
            return Some(query.to_string());
        }
        if let Some(source) = &self.source {
            return Some(source.body.clone());
        }
        self.nodes.as_ref().map(Value::to_string)
    }
}

/// Displays (only) the error message.
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.message.fmt(f)
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn serializes_only_wire_fields() {
        let error = Error::builder()
            .message("Cannot query field \"unknown\" on type \"Query\".")
            .location(Location { line: 1, column: 3 })
            .extension_code("GRAPHQL_VALIDATION_FAILED")
            .source(Source::new("{ unknown }"))
            .stack("GraphQLError: Cannot query field")
            .build();

        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({
                "message": "Cannot query field \"unknown\" on type \"Query\".",
                "locations": [{ "line": 1, "column": 3 }],
                "extensions": { "code": "GRAPHQL_VALIDATION_FAILED" }
            })
        );
    }

    #[test]
    fn extension_code_does_not_override_explicit_code() {
        let error = Error::builder()
            .message("boom")
            .extension("code", "CUSTOM")
            .extension_code("GENERATED")
            .build();
        assert_eq!(error.extension_code().as_deref(), Some("CUSTOM"));
    }

    #[test]
    fn query_lookup_priority() {
        let nodes_only = Error::builder()
            .message("m")
            .nodes(json!([{ "kind": "Field" }]))
            .build();
        assert_eq!(
            nodes_only.query().as_deref(),
            Some(r#"[{"kind":"Field"}]"#)
        );

        let with_source = Error::builder()
            .message("m")
            .nodes(json!([{ "kind": "Field" }]))
            .source(Source::new("{ a }"))
            .build();
        assert_eq!(with_source.query().as_deref(), Some("{ a }"));

        let with_extension = Error::builder()
            .message("m")
            .source(Source::new("{ a }"))
            .extension("query", "{ b }")
            .build();
        assert_eq!(with_extension.query().as_deref(), Some("{ b }"));

        assert_eq!(Error::builder().message("m").build().query(), None);
    }

    #[test]
    fn service_name_from_extensions() {
        let error = Error::builder()
            .message("m")
            .extension("serviceName", "customer")
            .build();
        assert_eq!(error.service_name(), Some("customer"));
    }
}
