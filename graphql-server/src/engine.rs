//! The seam to the GraphQL engine that parses, validates and executes operations.
//!
//! The server never inspects schemas or documents itself: it hands them back to the engine and
//! only looks at the errors and results that come out.
use std::sync::Arc;

use async_trait::async_trait;
use tower::BoxError;

use crate::graphql;
use crate::graphql::Object;

/// The kind of operation a document selects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display, strum_macros::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}

/// Options for [`GraphQLEngine::validate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidationOptions {
    /// When `false` the engine must reject introspection queries.
    pub introspection: bool,
}

/// Per request context handed to the engine at execution time.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    /// Overrides the logger's service name for every entry logged while handling this request.
    pub service_name: Option<String>,
    /// Arbitrary values for resolvers.
    pub extensions: http::Extensions,
}

impl RequestContext {
    pub fn with_service_name(service_name: impl Into<String>) -> Self {
        Self {
            service_name: Some(service_name.into()),
            ..Default::default()
        }
    }
}

/// Everything needed to execute one operation.
#[non_exhaustive]
pub struct ExecutionArgs<S, D> {
    pub schema: Arc<S>,
    pub document: D,
    /// Decoded variables, whatever shape they arrived in.
    pub variables: Option<Object>,
    pub operation_name: Option<String>,
    pub context: RequestContext,
}

/// A GraphQL engine.
///
/// Errors the engine *reports* (syntax, validation, field errors in an execution result) are
/// [`graphql::Error`] values. Failures it *raises* while executing are returned as the `Err` of
/// [`GraphQLEngine::execute`].
#[async_trait]
pub trait GraphQLEngine: Send + Sync + 'static {
    type Schema: Send + Sync + 'static;
    type Document: Send + 'static;

    fn parse(&self, source: &str) -> Result<Self::Document, graphql::Error>;

    /// An empty list means the schema can serve requests.
    fn validate_schema(&self, schema: &Self::Schema) -> Vec<graphql::Error>;

    fn validate(
        &self,
        schema: &Self::Schema,
        document: &Self::Document,
        options: ValidationOptions,
    ) -> Vec<graphql::Error>;

    /// The type of the operation `operation_name` selects, `None` if it selects nothing.
    fn operation_type(
        &self,
        document: &Self::Document,
        operation_name: Option<&str>,
    ) -> Option<OperationType>;

    async fn execute(
        &self,
        args: ExecutionArgs<Self::Schema, Self::Document>,
    ) -> Result<graphql::Response, BoxError>;
}
