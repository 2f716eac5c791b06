use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use super::Object;

/// The `query`, `variables` and `operationName` extracted from an incoming request.
///
/// `variables` keeps the shape it arrived in: a raw [`Value::String`] when it was read from URL
/// parameters or a form body, structured JSON when it was read from a JSON body. See
/// [`Request::variables_object`] for the decoded form.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Request {
    /// The GraphQL operation (e.g., query, mutation) string.
    ///
    /// For historical purposes, the term "query" is commonly used to refer to
    /// *any* GraphQL operation which might be, e.g., a `mutation`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub query: Option<String>,

    /// The (optional) GraphQL variables.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub variables: Option<Value>,

    /// The (optional) GraphQL operation name.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub operation_name: Option<String>,
}

#[buildstructor::buildstructor]
impl Request {
    #[builder(visibility = "pub")]
    fn new(query: Option<String>, variables: Option<Value>, operation_name: Option<String>) -> Self {
        Self {
            query,
            variables,
            operation_name,
        }
    }
}

impl Request {
    /// Convert encoded URL query string parameters (also known as "search
    /// params") into a GraphQL [`Request`].
    ///
    /// Missing keys stay `None`, and `variables` is kept as the raw string. Parameters that
    /// cannot be decoded are ignored rather than rejected.
    pub fn from_urlencoded_query(url_encoded_query: &str) -> Request {
        let pairs: Vec<(String, String)> =
            serde_urlencoded::from_str(url_encoded_query).unwrap_or_default();
        let first = |key: &str| {
            pairs
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.clone())
        };

        Request {
            query: first("query"),
            variables: first("variables").map(Value::String),
            operation_name: first("operationName"),
        }
    }

    /// Read the request fields straight off a JSON value, without validating its shape.
    pub fn from_json_fields(body: &Value) -> Request {
        Request {
            query: body.get("query").and_then(Value::as_str).map(str::to_owned),
            variables: body.get("variables").filter(|v| !v.is_null()).cloned(),
            operation_name: body
                .get("operationName")
                .and_then(Value::as_str)
                .map(str::to_owned),
        }
    }

    /// Encode this request as URL query string parameters, the inverse of
    /// [`Request::from_urlencoded_query`]. Structured variables are JSON-stringified.
    pub fn to_urlencoded_query(&self) -> String {
        let mut pairs: Vec<(&str, String)> = Vec::with_capacity(3);
        if let Some(query) = &self.query {
            pairs.push(("query", query.clone()));
        }
        if let Some(operation_name) = &self.operation_name {
            pairs.push(("operationName", operation_name.clone()));
        }
        match &self.variables {
            Some(Value::String(raw)) => pairs.push(("variables", raw.clone())),
            Some(variables) => pairs.push(("variables", variables.to_string())),
            None => {}
        }
        serde_urlencoded::to_string(pairs).unwrap_or_default()
    }

    /// The variables as a JSON object, decoding them first when they arrived as a raw string.
    ///
    /// `null` decodes to `None`.
    pub fn variables_object(&self) -> Result<Option<Object>, serde_json::Error> {
        let decoded = match &self.variables {
            None => return Ok(None),
            Some(Value::String(raw)) => serde_json::from_str::<Value>(raw)?,
            Some(structured) => structured.clone(),
        };
        serde_json::from_value::<Option<Object>>(decoded)
    }

    /// Fill every field missing from `self` with the one from `fallback`.
    pub(crate) fn or(self, fallback: Request) -> Request {
        Request {
            query: self.query.or(fallback.query),
            variables: self.variables.or(fallback.variables),
            operation_name: self.operation_name.or(fallback.operation_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn from_urlencoded_query_works() {
        let query_string = "query=%7B+topProducts+%7B+upc+name+%7D+%7D&operationName=Top&variables=%7B%22first%22%3A5%7D";

        let request = Request::from_urlencoded_query(query_string);

        assert_eq!(
            request,
            Request::builder()
                .query("{ topProducts { upc name } }")
                .operation_name("Top")
                .variables(Value::String(r#"{"first":5}"#.to_string()))
                .build()
        );
    }

    #[test]
    fn missing_parameters_are_none() {
        let request = Request::from_urlencoded_query("other=1");
        assert_eq!(request, Request::default());

        let request = Request::from_urlencoded_query("");
        assert_eq!(request, Request::default());
    }

    #[test]
    fn empty_parameter_is_kept_as_empty_string() {
        let request = Request::from_urlencoded_query("query=&operationName=");
        assert_eq!(request.query.as_deref(), Some(""));
        assert_eq!(request.operation_name.as_deref(), Some(""));
    }

    #[test]
    fn first_occurrence_wins() {
        let request = Request::from_urlencoded_query("query=%7Ba%7D&query=%7Bb%7D");
        assert_eq!(request.query.as_deref(), Some("{a}"));
    }

    #[test]
    fn url_round_trip() {
        let original = Request::builder()
            .query("query Greeting($name: String!) { hello(name: $name) & more }")
            .operation_name("Greeting")
            .variables(json!({ "name": "Ünïcode + spaces" }))
            .build();

        let decoded = Request::from_urlencoded_query(&original.to_urlencoded_query());

        assert_eq!(decoded.query, original.query);
        assert_eq!(decoded.operation_name, original.operation_name);
        assert_eq!(
            decoded.variables,
            Some(Value::String(
                json!({ "name": "Ünïcode + spaces" }).to_string()
            ))
        );
    }

    #[test]
    fn json_fields_are_read_best_effort() {
        let body = json!({
            "query": "{ a }",
            "variables": { "id": 1 },
            "operationName": 42,
            "extra": true
        });
        let request = Request::from_json_fields(&body);
        assert_eq!(request.query.as_deref(), Some("{ a }"));
        assert_eq!(request.variables, Some(json!({ "id": 1 })));
        assert_eq!(request.operation_name, None);

        assert_eq!(Request::from_json_fields(&json!([1, 2])), Request::default());
    }

    #[test]
    fn variables_object_decodes_both_shapes() {
        let raw = Request::builder()
            .variables(Value::String(r#"{"id":"1"}"#.to_string()))
            .build();
        let structured = Request::builder().variables(json!({ "id": "1" })).build();

        let expected = json!({ "id": "1" }).as_object().cloned();
        assert_eq!(raw.variables_object().unwrap(), expected);
        assert_eq!(structured.variables_object().unwrap(), expected);

        let null = Request::builder()
            .variables(Value::String("null".to_string()))
            .build();
        assert_eq!(null.variables_object().unwrap(), None);

        let invalid = Request::builder()
            .variables(Value::String("{not json".to_string()))
            .build();
        assert!(invalid.variables_object().is_err());

        let not_an_object = Request::builder().variables(json!([1])).build();
        assert!(not_an_object.variables_object().is_err());
    }

    #[test]
    fn null_variables_are_absent() {
        let request = Request::from_json_fields(&json!({ "query": "{ a }", "variables": null }));
        assert_eq!(request.variables, None);
    }
}
