//! Axum router serving a [`GraphQLServer`].
use std::error::Error as _;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::Request;
use axum::extract::State;
use axum::response::Response;
use axum::routing::any;
use axum::routing::get;
use http::StatusCode;
use http_body_util::LengthLimitError;

use crate::body;
use crate::engine::GraphQLEngine;
use crate::engine::RequestContext;
use crate::error::ExtractionError;
use crate::server::GraphQLServer;

pub(crate) const UNREADABLE_BODY_MESSAGE: &str = "Cannot read the request body.";

/// Routes for the GraphQL endpoint (any method) and the metrics endpoint (`GET`).
pub fn router<E: GraphQLEngine>(server: Arc<GraphQLServer<E>>) -> Router {
    let paths = &server.configuration().server;
    let graphql_path = paths.graphql_path.clone();
    let metrics_path = paths.metrics_path.clone();

    Router::new()
        .route(&graphql_path, any(handle_graphql::<E>))
        .route(&metrics_path, get(handle_metrics::<E>))
        .with_state(server)
}

async fn handle_graphql<E: GraphQLEngine>(
    State(server): State<Arc<GraphQLServer<E>>>,
    request: Request,
) -> Response {
    let limit = server.configuration().server.body_limit_bytes();
    let (parts, body) = request.into_parts();

    let bytes = match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::debug!("failed to read request body: {error}");
            return server
                .handle_transport_error(read_error(&error), &RequestContext::default())
                .map(Body::from);
        }
    };

    let response = match body::decode(&parts.headers, bytes, limit) {
        Ok(body) => {
            server
                .handle_request(http::Request::from_parts(parts, body))
                .await
        }
        Err(error) => server.handle_transport_error(error, &RequestContext::default()),
    };
    response.map(Body::from)
}

async fn handle_metrics<E: GraphQLEngine>(
    State(server): State<Arc<GraphQLServer<E>>>,
) -> Response {
    server.metrics_response().map(Body::from)
}

/// `413` when the body went over the size limit, `400` for any other read failure.
fn read_error(error: &axum::Error) -> ExtractionError {
    let mut source = Some(error as &(dyn std::error::Error + 'static));
    while let Some(current) = source {
        if current.is::<LengthLimitError>() {
            return ExtractionError::new(StatusCode::PAYLOAD_TOO_LARGE, body::TOO_LARGE_MESSAGE);
        }
        source = current.source();
    }
    ExtractionError::bad_request(UNREADABLE_BODY_MESSAGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn limit_errors_are_too_large() {
        let error = axum::body::to_bytes(Body::from("0123456789"), 4)
            .await
            .unwrap_err();
        let error = read_error(&error);
        assert_eq!(error.status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(error.message(), body::TOO_LARGE_MESSAGE);
    }

    #[test]
    fn other_read_errors_are_bad_requests() {
        let error = axum::Error::new(std::io::Error::other("connection reset by peer"));
        let error = read_error(&error);
        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(error.message(), UNREADABLE_BODY_MESSAGE);
    }
}
