//! Server errors.
use displaydoc::Display;
use http::StatusCode;
use thiserror::Error;

pub use crate::configuration::ConfigurationError;
use crate::graphql;

/// The category an error is counted and logged under.
///
/// Categories are never carried by the engine's errors; they are inferred by the server or by
/// the heuristics in [`crate::classification`].
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter,
    strum_macros::IntoStaticStr,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    GraphqlError,
    FetchError,
    ValidationError,
    IntrospectionDisabledError,
    SchemaValidationError,
    MethodNotAllowedError,
    InvalidSchemaError,
    MissingQueryParameterError,
    SyntaxError,
}

impl ErrorCategory {
    /// The metric label / log error name of this category.
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

// A GraphQL error paired with the HTTP status it should be reported with. Returned whenever
// request information cannot be extracted, so that a well formed JSON error body can always be
// written.
/// {error}
#[derive(Error, Display, Debug, Clone, PartialEq)]
pub struct ExtractionError {
    /// The error reported to the client.
    pub error: graphql::Error,
    /// HTTP status of the response.
    pub status: StatusCode,
}

impl ExtractionError {
    pub(crate) fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            error: graphql::Error::builder().message(message).build(),
            status,
        }
    }

    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// The message of the wrapped error.
    pub fn message(&self) -> &str {
        &self.error.message
    }
}

/// Error creating a [`GraphQLServer`](crate::server::GraphQLServer).
#[derive(Debug, Error, Display)]
#[non_exhaustive]
pub enum ServerError {
    /// could not register metrics: {0}
    Metrics(#[from] prometheus::Error),
}
