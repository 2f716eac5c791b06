//! Extraction of `query`, `variables` and `operationName` from incoming requests.
//!
//! Extraction never fails with a panic or an `Err` that escapes the request: every failure is an
//! [`ExtractionError`] carrying the status code to answer with.

use bytes::Bytes;
use http::HeaderMap;
use http::Method;
use http::header::CONTENT_TYPE;
use serde_json::Value;

use crate::content_type::ContentType;
use crate::error::ExtractionError;
use crate::graphql;

/// The request abstraction the server works on.
pub type Request = http::Request<RequestBody>;

/// A request body that has already been read into memory.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RequestBody {
    /// No body was sent.
    #[default]
    Empty,
    /// A body decoded as text.
    Text(String),
    /// A body that was already parsed upstream.
    Json(Value),
    /// Raw bytes that were not decoded.
    Binary(Bytes),
}

impl RequestBody {
    /// Name of the body's runtime type, as reported in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            RequestBody::Empty => "empty",
            RequestBody::Text(_) => "string",
            RequestBody::Binary(_) => "buffer",
            RequestBody::Json(value) => match value {
                Value::Null => "null",
                Value::Bool(_) => "boolean",
                Value::Number(_) => "number",
                Value::String(_) => "string",
                Value::Array(_) | Value::Object(_) => "object",
            },
        }
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        RequestBody::Text(text.to_string())
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Text(text)
    }
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        RequestBody::Json(value)
    }
}

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> Self {
        RequestBody::Binary(bytes)
    }
}

pub(crate) const INVALID_JSON_MESSAGE: &str = "POST body contains invalid JSON.";

/// Body content the extractor can work with.
enum Content<'a> {
    Text(&'a str),
    Structured(&'a Value),
}

/// Extract the GraphQL request information from `request`.
///
/// URL parameters take precedence over the body, field by field. A `GET` request never has its
/// body read. A body that cannot be used is only reported when the URL did not provide a query.
pub fn extract_request_info(request: &Request) -> Result<graphql::Request, ExtractionError> {
    let from_url = request
        .uri()
        .query()
        .map(graphql::Request::from_urlencoded_query)
        .unwrap_or_default();

    if request.method() == Method::GET {
        return Ok(from_url);
    }

    match extract_from_body(request.headers(), request.body()) {
        Ok(from_body) => Ok(from_url.or(from_body)),
        Err(_) if from_url.query.as_deref().is_some_and(|q| !q.is_empty()) => Ok(from_url),
        Err(error) => Err(error),
    }
}

fn extract_from_body(
    headers: &HeaderMap,
    body: &RequestBody,
) -> Result<graphql::Request, ExtractionError> {
    let content = match body {
        RequestBody::Text(text) => Content::Text(text),
        RequestBody::Json(Value::String(text)) => Content::Text(text),
        RequestBody::Json(value @ (Value::Object(_) | Value::Array(_))) => {
            Content::Structured(value)
        }
        RequestBody::Binary(_) => {
            return Err(ExtractionError::bad_request(
                "POST body contains a binary buffer. Only \"object\" and \"string\" are supported, the body must be decoded first.",
            ));
        }
        RequestBody::Empty | RequestBody::Json(_) => {
            return Err(ExtractionError::bad_request(format!(
                "POST body contains invalid type {}. Only \"object\" and \"string\" are supported.",
                body.type_name()
            )));
        }
    };

    let Some(content_type) = headers.get(CONTENT_TYPE) else {
        return Err(ExtractionError::bad_request(
            "POST request is missing the content-type header.",
        ));
    };
    let content_type = String::from_utf8_lossy(content_type.as_bytes());

    match ContentType::resolve(Some(&content_type)) {
        ContentType::Graphql => Ok(graphql::Request::builder()
            .query(match content {
                Content::Text(text) => text.to_string(),
                Content::Structured(value) => value.to_string(),
            })
            .build()),
        ContentType::Json => match content {
            Content::Text(text) => serde_json::from_str::<Value>(text)
                .map(|value| graphql::Request::from_json_fields(&value))
                .map_err(|error| {
                    tracing::debug!("failed to parse POST body as JSON: {error}");
                    ExtractionError::bad_request(INVALID_JSON_MESSAGE)
                }),
            Content::Structured(value) => Ok(graphql::Request::from_json_fields(value)),
        },
        ContentType::Urlencoded => match content {
            Content::Text(text) => Ok(graphql::Request::from_urlencoded_query(text)),
            // already decoded into an object by a form parser upstream
            Content::Structured(value) => Ok(graphql::Request::from_json_fields(value)),
        },
        ContentType::Unknown => Err(ExtractionError::bad_request(format!(
            "POST body contains unsupported content-type \"{content_type}\"."
        ))),
    }
}
