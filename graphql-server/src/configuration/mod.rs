//! Logic for loading configuration in to an object model
mod server;

use std::path::Path;
use std::str::FromStr;

use displaydoc::Display;
use schemars::JsonSchema;
use schemars::schema::RootSchema;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

pub use self::server::Server;
use crate::logging::DEFAULT_TRUNCATED_TEXT;
use crate::logging::LogFormat;

/// Configuration error.
#[derive(Debug, Error, Display)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// could not read configuration: {0}
    CannotRead(#[from] std::io::Error),
    /// could not deserialize configuration: {0}
    DeserializeConfigError(#[from] serde_yaml::Error),
    /// {message}: {error}
    InvalidConfiguration {
        message: &'static str,
        error: String,
    },
}

/// The configuration of the GraphQL server.
///
/// Can be created through `serde::Deserialize` from various formats, or inline in Rust code with
/// `serde_json::json!` and `serde_json::from_value`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Configuration {
    /// Log entry settings.
    #[serde(default)]
    pub logging: Logging,

    /// HTTP endpoints and request body handling.
    #[serde(default)]
    pub server: Server,

    /// Options passed to the GraphQL engine.
    #[serde(default)]
    pub graphql: Graphql,

    /// Metrics collection.
    #[serde(default)]
    pub metrics: Metrics,
}

impl Configuration {
    /// Read and validate a YAML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let raw = std::fs::read_to_string(path)?;
        raw.parse()
    }

    /// JSON schema of the configuration file, for editor completion.
    pub fn json_schema() -> RootSchema {
        schemars::schema_for!(Configuration)
    }

    fn validate(self) -> Result<Self, ConfigurationError> {
        for (message, path) in [
            ("invalid 'server.graphql_path'", &self.server.graphql_path),
            ("invalid 'server.metrics_path'", &self.server.metrics_path),
        ] {
            if !path.starts_with('/') {
                return Err(ConfigurationError::InvalidConfiguration {
                    message,
                    error: format!("'{path}' must start with '/'"),
                });
            }
        }
        if self.server.graphql_path == self.server.metrics_path {
            return Err(ConfigurationError::InvalidConfiguration {
                message: "invalid 'server.metrics_path'",
                error: "the GraphQL and metrics endpoints must use different paths".to_string(),
            });
        }
        Ok(self)
    }
}

/// Parse configuration from a string in YAML syntax
impl FromStr for Configuration {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // an empty document means "all defaults"
        if s.trim().is_empty() {
            return Ok(Configuration::default());
        }
        serde_yaml::from_str::<Configuration>(s)?.validate()
    }
}

/// Log entry settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct Logging {
    /// Reported as `logger` in every entry.
    pub logger_name: String,

    /// Reported as `serviceName` unless a request provides its own.
    /// Errors raised by other services are logged as warnings.
    pub service_name: String,

    /// Line format.
    pub format: LogFormat,

    /// Emit debug entries.
    pub debug: bool,

    /// Maximum message length in characters; 0 disables truncation.
    pub truncate_limit: usize,

    /// Appended to truncated messages.
    pub truncated_text: String,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            logger_name: default_name(),
            service_name: default_name(),
            format: LogFormat::default(),
            debug: false,
            truncate_limit: 0,
            truncated_text: DEFAULT_TRUNCATED_TEXT.to_string(),
        }
    }
}

fn default_name() -> String {
    String::from("graphql-server")
}

/// Options passed to the GraphQL engine.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct Graphql {
    /// Allow introspection queries.
    /// enabled by default
    pub introspection: bool,
}

impl Default for Graphql {
    fn default() -> Self {
        Self {
            introspection: true,
        }
    }
}

/// Metrics collection.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct Metrics {
    /// Collect prometheus metrics; when disabled the metrics endpoint answers with an empty body.
    /// enabled by default
    pub enabled: bool,
}

impl Default for Metrics {
    fn default() -> Self {
        Self { enabled: true }
    }
}
