//! Heuristic classification of caught errors.
//!
//! The engine does not report a structured kind for its errors, so categories are inferred by
//! looking for trigger substrings in the error message. This is inherently heuristic: new engine
//! or transport messages may be misclassified until their wording is added to the tables below.

use crate::error::ErrorCategory;

/// Substrings marking an error as a failure to reach a remote service.
pub const FETCH_ERROR_TRIGGERS: &[&str] = &[
    "FetchError",
    "ECONNREFUSED",
    "ECONNRESET",
    "ETIMEDOUT",
    "socket hang up",
];

/// Every substring group in this table must be present for a message to count as a rejected
/// introspection query. Groups are alternatives.
pub const INTROSPECTION_DISABLED_TRIGGERS: &[&[&str]] =
    &[&["introspection", "disabled"], &["__Directive"]];

/// A caught error as seen by the classifier: its message, or `None` when the caught value was
/// not an error and has no message to inspect.
pub type CaughtMessage<'a> = Option<&'a str>;

/// Decide whether a caught error is a [`ErrorCategory::FetchError`] or a
/// [`ErrorCategory::GraphqlError`]. Values without a message are always GraphQL errors.
pub fn fetch_or_graphql(message: CaughtMessage<'_>) -> ErrorCategory {
    match message {
        Some(message) if contains_any(message, FETCH_ERROR_TRIGGERS) => ErrorCategory::FetchError,
        _ => ErrorCategory::GraphqlError,
    }
}

/// Decide whether a validation error rejected an introspection query.
pub fn validation_or_introspection(message: CaughtMessage<'_>) -> ErrorCategory {
    match message {
        Some(message)
            if INTROSPECTION_DISABLED_TRIGGERS
                .iter()
                .any(|group| group.iter().all(|trigger| message.contains(trigger))) =>
        {
            ErrorCategory::IntrospectionDisabledError
        }
        _ => ErrorCategory::ValidationError,
    }
}

/// [`fetch_or_graphql`] for a Rust error, looking through its whole `source()` chain.
pub fn fetch_or_graphql_error(error: &(dyn std::error::Error + 'static)) -> ErrorCategory {
    let mut current = Some(error);
    while let Some(error) = current {
        if fetch_or_graphql(Some(&error.to_string())) == ErrorCategory::FetchError {
            return ErrorCategory::FetchError;
        }
        current = error.source();
    }
    ErrorCategory::GraphqlError
}

fn contains_any(message: &str, triggers: &[&str]) -> bool {
    triggers.iter().any(|trigger| message.contains(trigger))
}
