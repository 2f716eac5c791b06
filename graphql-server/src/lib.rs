//! Request handling for a GraphQL endpoint.
//!
//! A [`GraphQLServer`] extracts `query`, `variables` and `operationName` from HTTP requests,
//! drives a [`GraphQLEngine`] through parsing, validation and execution, and answers with a JSON
//! response. Every error along the way is classified into an [`ErrorCategory`], logged and
//! counted.

pub mod axum_factory;
pub mod body;
pub mod classification;
pub mod configuration;
pub mod content_type;
pub mod engine;
pub mod error;
pub mod extraction;
pub mod graphql;
pub mod logging;
pub mod metrics;
pub mod response;
pub mod server;
pub mod subscriber;

pub use crate::configuration::Configuration;
pub use crate::content_type::ContentType;
pub use crate::engine::ExecutionArgs;
pub use crate::engine::GraphQLEngine;
pub use crate::engine::OperationType;
pub use crate::engine::RequestContext;
pub use crate::engine::ValidationOptions;
pub use crate::error::ErrorCategory;
pub use crate::error::ExtractionError;
pub use crate::extraction::RequestBody;
pub use crate::extraction::extract_request_info;
pub use crate::logging::Logger;
pub use crate::metrics::MetricsClient;
pub use crate::server::GraphQLServer;
