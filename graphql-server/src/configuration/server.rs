use bytesize::ByteSize;
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;

fn default_graphql_path() -> String {
    String::from("/graphql")
}

fn default_metrics_path() -> String {
    String::from("/metrics")
}

fn default_body_limit() -> ByteSize {
    ByteSize::kb(100)
}

/// Configuration options pertaining to the http server component.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Server {
    /// The HTTP path on which GraphQL requests will be served.
    /// default: "/graphql"
    #[serde(default = "default_graphql_path")]
    pub graphql_path: String,

    /// The HTTP path serving the metrics in the prometheus text format.
    /// default: "/metrics"
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,

    /// Maximum size of a request body after decompression, in human-readable format.
    /// default: 100KB
    #[serde(default = "default_body_limit")]
    #[schemars(with = "String")]
    pub body_limit: ByteSize,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            graphql_path: default_graphql_path(),
            metrics_path: default_metrics_path(),
            body_limit: default_body_limit(),
        }
    }
}

impl Server {
    /// The body limit in bytes, saturating on platforms where it does not fit a `usize`.
    pub fn body_limit_bytes(&self) -> usize {
        usize::try_from(self.body_limit.as_u64()).unwrap_or(usize::MAX)
    }
}
