//! Writes execution results and errors as HTTP responses.
use bytes::Bytes;
use http::HeaderMap;
use http::HeaderValue;
use http::StatusCode;
use http::header::CONTENT_TYPE;

use crate::graphql;
use crate::metrics::MetricsClient;

/// `content-type` of every GraphQL response.
pub const APPLICATION_JSON_UTF8: &str = "application/json; charset=utf-8";

/// The response type produced by the server.
pub type Response = http::Response<Bytes>;

/// Serialize `body` and write it with `status` and the extra `headers`.
///
/// Extra headers are added after `content-type` and replace it if they also set one.
pub fn dispatch(status: StatusCode, body: &graphql::Response, headers: HeaderMap) -> Response {
    let (status, bytes) = match serde_json::to_vec(body) {
        Ok(bytes) => (status, Bytes::from(bytes)),
        Err(error) => {
            tracing::error!("cannot serialize GraphQL response: {error}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Bytes::from_static(br#"{"errors":[{"message":"Internal server error"}]}"#),
            )
        }
    };

    let mut response = http::Response::new(bytes);
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON_UTF8));
    // the first value of a name replaces what is set, the following ones are appended
    let mut last_name = None;
    for (name, value) in headers {
        if let Some(name) = name {
            response.headers_mut().remove(&name);
            last_name = Some(name);
        }
        if let Some(name) = &last_name {
            response.headers_mut().append(name, value);
        }
    }
    response
}

/// A response that carries nothing but `errors`.
pub fn dispatch_errors(
    status: StatusCode,
    errors: Vec<graphql::Error>,
    headers: HeaderMap,
) -> Response {
    dispatch(status, &graphql::Response::from_errors(errors), headers)
}

/// The metrics scrape payload of `client`.
pub fn metrics(client: &dyn MetricsClient) -> Response {
    let mut response = http::Response::new(Bytes::from(client.metrics()));
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static(client.content_type()),
    );
    response
}

#[cfg(test)]
mod tests {
    use http::header::ALLOW;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::metrics::METRICS_CONTENT_TYPE;
    use crate::metrics::NoMetricsClient;

    fn json_body(response: &Response) -> serde_json::Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    #[test]
    fn writes_status_content_type_and_body() {
        let body = graphql::Response::builder()
            .data(json!({ "user": { "name": "Ada" } }))
            .build();

        let response = dispatch(StatusCode::OK, &body, HeaderMap::new());

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], APPLICATION_JSON_UTF8);
        assert_eq!(json_body(&response), json!({ "data": { "user": { "name": "Ada" } } }));
    }

    #[test]
    fn errors_only() {
        let response = dispatch_errors(
            StatusCode::BAD_REQUEST,
            vec![graphql::Error::builder().message("Variables are invalid JSON.").build()],
            HeaderMap::new(),
        );

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(&response),
            json!({ "errors": [{ "message": "Variables are invalid JSON." }] })
        );
    }

    #[test]
    fn custom_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(ALLOW, HeaderValue::from_static("GET, POST"));
        headers.append("x-trace", HeaderValue::from_static("a"));
        headers.append("x-trace", HeaderValue::from_static("b"));

        let response = dispatch(
            StatusCode::METHOD_NOT_ALLOWED,
            &graphql::Response::default(),
            headers,
        );

        assert_eq!(response.headers()[ALLOW], "GET, POST");
        assert_eq!(response.headers().get_all("x-trace").iter().count(), 2);
        assert_eq!(response.headers()[CONTENT_TYPE], APPLICATION_JSON_UTF8);
        assert_eq!(response.body().as_ref(), b"{}");
    }

    #[test]
    fn custom_content_type_replaces_the_default() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/graphql-response+json"),
        );
        let response = dispatch(StatusCode::OK, &graphql::Response::default(), headers);
        assert_eq!(
            response.headers().get_all(CONTENT_TYPE).iter().collect::<Vec<_>>(),
            vec!["application/graphql-response+json"]
        );
    }

    #[test]
    fn metrics_payload() {
        let response = metrics(&NoMetricsClient);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], METRICS_CONTENT_TYPE);
        assert!(response.body().is_empty());
    }
}
