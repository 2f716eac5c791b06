//! Request handling from an extracted request to a written response.
use std::sync::Arc;

use http::HeaderMap;
use http::HeaderValue;
use http::Method;
use http::StatusCode;
use http::header::ALLOW;
use parking_lot::RwLock;

use crate::classification;
use crate::configuration::Configuration;
use crate::engine::ExecutionArgs;
use crate::engine::GraphQLEngine;
use crate::engine::OperationType;
use crate::engine::RequestContext;
use crate::engine::ValidationOptions;
use crate::error::ErrorCategory;
use crate::error::ExtractionError;
use crate::error::ServerError;
use crate::extraction::Request;
use crate::extraction::extract_request_info;
use crate::graphql;
use crate::logging::LoggedError;
use crate::logging::Logger;
use crate::metrics::MetricsClient;
use crate::metrics::NoMetricsClient;
use crate::metrics::PrometheusMetricsClient;
use crate::response;
use crate::response::Response;

pub(crate) const INVALID_SCHEMA_MESSAGE: &str =
    "Request cannot be processed. Schema in GraphQL server is invalid.";
pub(crate) const METHOD_NOT_ALLOWED_MESSAGE: &str = "GraphQL only supports GET and POST requests.";
pub(crate) const MISSING_QUERY_MESSAGE: &str =
    "Request cannot be processed. No query was found in parameters or body.";
pub(crate) const INVALID_VARIABLES_MESSAGE: &str = "Variables are invalid JSON.";
pub(crate) const GET_ONLY_QUERY_MESSAGE: &str =
    "Only \"query\" operation can be executed via GET request.";

/// A GraphQL endpoint in front of a [`GraphQLEngine`].
///
/// The server owns its logger and metrics; it can be shared between tasks behind an [`Arc`].
pub struct GraphQLServer<E: GraphQLEngine> {
    engine: E,
    /// `None` while the current schema is invalid.
    schema: RwLock<Option<Arc<E::Schema>>>,
    configuration: Configuration,
    logger: Logger,
    metrics: Arc<dyn MetricsClient>,
}

impl<E: GraphQLEngine> std::fmt::Debug for GraphQLServer<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphQLServer")
            .field("available", &self.is_available())
            .field("configuration", &self.configuration)
            .finish_non_exhaustive()
    }
}

impl<E: GraphQLEngine> GraphQLServer<E> {
    /// Create a server collecting prometheus metrics, unless they are disabled in
    /// `configuration`.
    pub fn new(
        engine: E,
        schema: E::Schema,
        configuration: Configuration,
    ) -> Result<Self, ServerError> {
        let metrics: Arc<dyn MetricsClient> = if configuration.metrics.enabled {
            Arc::new(PrometheusMetricsClient::new()?)
        } else {
            Arc::new(NoMetricsClient)
        };
        Ok(Self::with_metrics(engine, schema, configuration, metrics))
    }

    /// Create a server reporting to the given metrics client. The client is reset first.
    pub fn with_metrics(
        engine: E,
        schema: E::Schema,
        configuration: Configuration,
        metrics: Arc<dyn MetricsClient>,
    ) -> Self {
        metrics.init();
        let server = Self {
            engine,
            schema: RwLock::new(None),
            logger: Logger::new(&configuration.logging),
            configuration,
            metrics,
        };
        server.set_schema(schema);
        server
    }

    /// Replace the schema requests are served with. Returns whether the schema is valid.
    ///
    /// An invalid schema makes the server unavailable: every request is then answered with a
    /// `500` until a valid schema is set.
    pub fn set_schema(&self, schema: E::Schema) -> bool {
        let errors = self.engine.validate_schema(&schema);
        for error in &errors {
            self.report(
                "Schema validation failed:",
                error,
                ErrorCategory::SchemaValidationError,
                None,
            );
        }

        let valid = errors.is_empty();
        *self.schema.write() = valid.then(|| Arc::new(schema));
        self.metrics.set_availability(valid);
        if valid {
            self.logger.info("Schema updated");
        }
        valid
    }

    /// Whether the current schema is valid.
    pub fn is_available(&self) -> bool {
        self.schema.read().is_some()
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn metrics(&self) -> &dyn MetricsClient {
        self.metrics.as_ref()
    }

    /// The payload of the metrics endpoint.
    pub fn metrics_response(&self) -> Response {
        response::metrics(self.metrics.as_ref())
    }

    pub async fn handle_request(&self, request: Request) -> Response {
        self.handle_request_with_context(request, RequestContext::default())
            .await
    }

    /// Answer `request`. Every outcome, including failures, is a JSON response.
    pub async fn handle_request_with_context(
        &self,
        request: Request,
        context: RequestContext,
    ) -> Response {
        self.metrics.increase_request_throughput();

        let service_name = context.service_name.clone();
        let service_name = service_name.as_deref();

        let schema = self.schema.read().clone();
        let Some(schema) = schema else {
            return self.reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCategory::InvalidSchemaError,
                INVALID_SCHEMA_MESSAGE,
                HeaderMap::new(),
                service_name,
            );
        };

        let method = request.method().clone();
        if method != Method::GET && method != Method::POST {
            let mut headers = HeaderMap::new();
            headers.insert(ALLOW, HeaderValue::from_static("GET, POST"));
            return self.reject(
                StatusCode::METHOD_NOT_ALLOWED,
                ErrorCategory::MethodNotAllowedError,
                METHOD_NOT_ALLOWED_MESSAGE,
                headers,
                service_name,
            );
        }

        let request_info = match extract_request_info(&request) {
            Ok(request_info) => request_info,
            Err(error) => {
                self.report(
                    "Error while extracting request info:",
                    &error.error,
                    ErrorCategory::GraphqlError,
                    service_name,
                );
                return response::dispatch_errors(
                    error.status,
                    vec![error.error],
                    HeaderMap::new(),
                );
            }
        };

        let Some(query) = request_info.query.as_deref().filter(|query| !query.is_empty()) else {
            return self.reject(
                StatusCode::BAD_REQUEST,
                ErrorCategory::MissingQueryParameterError,
                MISSING_QUERY_MESSAGE,
                HeaderMap::new(),
                service_name,
            );
        };

        let variables = match request_info.variables_object() {
            Ok(variables) => variables,
            Err(error) => {
                self.logger
                    .debug(&format!("cannot decode request variables: {error}"));
                return self.reject(
                    StatusCode::BAD_REQUEST,
                    ErrorCategory::GraphqlError,
                    INVALID_VARIABLES_MESSAGE,
                    HeaderMap::new(),
                    service_name,
                );
            }
        };

        let document = match self.engine.parse(query) {
            Ok(document) => document,
            Err(error) => {
                self.report(
                    "Error while parsing the query:",
                    &error,
                    ErrorCategory::SyntaxError,
                    service_name,
                );
                return response::dispatch_errors(
                    StatusCode::BAD_REQUEST,
                    vec![error],
                    HeaderMap::new(),
                );
            }
        };

        let validation_errors = self.engine.validate(
            &schema,
            &document,
            ValidationOptions {
                introspection: self.configuration.graphql.introspection,
            },
        );
        if !validation_errors.is_empty() {
            for error in &validation_errors {
                self.report(
                    "Error while validating the query:",
                    error,
                    classification::validation_or_introspection(Some(&error.message)),
                    service_name,
                );
            }
            return response::dispatch_errors(
                StatusCode::BAD_REQUEST,
                validation_errors,
                HeaderMap::new(),
            );
        }

        let operation_name = request_info.operation_name;
        if method == Method::GET {
            let operation_type = self
                .engine
                .operation_type(&document, operation_name.as_deref());
            if let Some(operation_type) = operation_type
                && operation_type != OperationType::Query
            {
                let mut headers = HeaderMap::new();
                headers.insert(ALLOW, HeaderValue::from_static("POST"));
                return self.reject(
                    StatusCode::METHOD_NOT_ALLOWED,
                    ErrorCategory::MethodNotAllowedError,
                    GET_ONLY_QUERY_MESSAGE,
                    headers,
                    service_name,
                );
            }
        }

        let execution = self
            .engine
            .execute(ExecutionArgs {
                schema,
                document,
                variables,
                operation_name,
                context,
            })
            .await;

        match execution {
            Ok(result) => {
                for error in &result.errors {
                    self.report(
                        "An error occurred while executing the request:",
                        error,
                        classification::fetch_or_graphql(Some(&error.message)),
                        service_name,
                    );
                }
                response::dispatch(StatusCode::OK, &result, HeaderMap::new())
            }
            Err(error) => {
                let category = classification::fetch_or_graphql_error(&*error);
                self.logger.error(
                    "An error occurred while executing the request:",
                    LoggedError::Other(&*error),
                    Some(category.as_str()),
                    service_name,
                );
                self.metrics.increase_errors(category);
                response::dispatch_errors(
                    StatusCode::BAD_REQUEST,
                    vec![graphql::Error::builder().message(error.to_string()).build()],
                    HeaderMap::new(),
                )
            }
        }
    }

    /// Answer a request whose body could not be read or decoded by the transport.
    ///
    /// The request counts towards throughput and its error is reported like an extraction
    /// failure.
    pub fn handle_transport_error(
        &self,
        error: ExtractionError,
        context: &RequestContext,
    ) -> Response {
        self.metrics.increase_request_throughput();
        self.report(
            "Error while reading the request body:",
            &error.error,
            ErrorCategory::GraphqlError,
            context.service_name.as_deref(),
        );
        response::dispatch_errors(error.status, vec![error.error], HeaderMap::new())
    }

    /// Log `error` under `category` and count it.
    fn report(
        &self,
        message: &str,
        error: &graphql::Error,
        category: ErrorCategory,
        service_name: Option<&str>,
    ) {
        self.logger.error(
            message,
            LoggedError::GraphQL(error),
            Some(category.as_str()),
            service_name,
        );
        self.metrics.increase_errors(category);
    }

    /// Report and answer with a single error raised by the server itself.
    fn reject(
        &self,
        status: StatusCode,
        category: ErrorCategory,
        message: &str,
        headers: HeaderMap,
        service_name: Option<&str>,
    ) -> Response {
        let error = graphql::Error::builder()
            .message(message)
            .extension_code(category.as_str())
            .build();
        self.report("Request rejected:", &error, category, service_name);
        response::dispatch_errors(status, vec![error], headers)
    }
}
