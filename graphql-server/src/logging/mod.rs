//! Structured log entries and the logger that emits them.
//!
//! Every log call builds a fresh [`LogEntry`], formats it as a single line and emits that line as
//! a `tracing` event at the entry's level.
pub(crate) mod formatters;

use std::sync::LazyLock;

use chrono::SecondsFormat;
use chrono::Utc;
use regex::Regex;
use serde::Serialize;

pub use self::formatters::LogFormat;
use self::formatters::LogFormatter;
use crate::configuration::Logging;
use crate::graphql;

/// Replaces the invalid variable value in engine messages such as
/// `Variable "$login" got invalid value {...}; Field "abc" is not defined by type "LoginInput".`
static INVALID_VARIABLE_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)got invalid value (.*); Field").expect("regex is valid")
});

/// Replacement for values removed from log messages.
pub const SANITIZED_VALUE: &str = "REMOVED BY SANITIZER";

/// Marker appended to truncated messages when none is configured.
pub const DEFAULT_TRUNCATED_TEXT: &str = "_TRUNCATED_";

/// Severity of a log entry.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, strum_macros::Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

/// One structured log record.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub logger: String,
    pub timestamp: String,
    pub message: String,
    pub level: LogLevel,
    pub service_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stacktrace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

/// An error attached to a log call.
#[derive(Clone, Copy, Debug)]
pub enum LoggedError<'a> {
    /// An error reported by the GraphQL engine.
    GraphQL(&'a graphql::Error),
    /// Any other error.
    Other(&'a (dyn std::error::Error + 'static)),
}

impl LoggedError<'_> {
    fn name(&self) -> &'static str {
        match self {
            LoggedError::GraphQL(error) => error.name(),
            LoggedError::Other(_) => "Error",
        }
    }

    fn message(&self) -> String {
        match self {
            LoggedError::GraphQL(error) => error.message.clone(),
            LoggedError::Other(error) => error.to_string(),
        }
    }

    /// The engine's stack if it captured one, or the `source()` chain of a Rust error.
    fn stack(&self) -> Option<String> {
        match self {
            LoggedError::GraphQL(error) => error.stack.clone(),
            LoggedError::Other(error) => {
                let mut causes = Vec::new();
                let mut current = error.source();
                while let Some(cause) = current {
                    causes.push(format!("caused by: {cause}"));
                    current = cause.source();
                }
                (!causes.is_empty())
                    .then(|| format!("{}: {error}\n{}", self.name(), causes.join("\n")))
            }
        }
    }
}

impl<'a> From<&'a graphql::Error> for LoggedError<'a> {
    fn from(error: &'a graphql::Error) -> Self {
        LoggedError::GraphQL(error)
    }
}

/// Everything a single log call provides besides the logger's own settings.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogEntryInput<'a> {
    pub message: &'a str,
    pub level: LogLevel,
    pub error: Option<LoggedError<'a>>,
    /// Reported as `errorName` instead of the error's own name.
    pub custom_error_name: Option<&'a str>,
    /// Service name of the request being handled; takes precedence over both the logger's
    /// service name and the one carried by the error.
    pub context_service_name: Option<&'a str>,
}

/// Builds, formats and emits log entries.
pub struct Logger {
    logger_name: String,
    service_name: String,
    debug: bool,
    truncate_limit: usize,
    truncated_text: String,
    formatter: Box<dyn LogFormatter>,
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("logger_name", &self.logger_name)
            .field("service_name", &self.service_name)
            .finish_non_exhaustive()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(&Logging::default())
    }
}

impl Logger {
    pub fn new(config: &Logging) -> Self {
        Self {
            logger_name: config.logger_name.clone(),
            service_name: config.service_name.clone(),
            debug: config.debug,
            truncate_limit: config.truncate_limit,
            truncated_text: config.truncated_text.clone(),
            formatter: config.format.formatter(),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Build the entry for one log call.
    pub fn create_log_entry(&self, input: LogEntryInput<'_>) -> LogEntry {
        let mut entry = LogEntry {
            logger: self.logger_name.clone(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            message: sanitize(input.message),
            level: input.level,
            service_name: input
                .context_service_name
                .unwrap_or(&self.service_name)
                .to_string(),
            error_name: None,
            stacktrace: None,
            query: None,
        };

        if let Some(error) = input.error {
            entry.error_name = Some(input.custom_error_name.unwrap_or(error.name()).to_string());
            let error_message = sanitize(&error.message());
            entry.message = if entry.message.is_empty() {
                error_message
            } else {
                format!("{} {error_message}", entry.message)
            };
            entry.stacktrace = error.stack().map(|stack| sanitize(&stack));

            if let LoggedError::GraphQL(error) = error {
                entry.query = error.query();
                if let Some(origin) = error.service_name() {
                    // errors raised by another service are not this service's failures
                    if origin != entry.service_name {
                        entry.level = LogLevel::Warn;
                        if input.context_service_name.is_none() {
                            entry.service_name = origin.to_string();
                        }
                    }
                }
            }
        }

        entry.message = truncate(entry.message, self.truncate_limit, &self.truncated_text);
        entry
    }

    /// Build, format and emit one log entry.
    pub fn log(&self, input: LogEntryInput<'_>) {
        if input.level == LogLevel::Debug && !self.debug {
            return;
        }
        let entry = self.create_log_entry(input);
        let line = self.formatter.format(&entry);
        match entry.level {
            LogLevel::Debug => tracing::debug!(target: "graphql_server", "{line}"),
            LogLevel::Info => tracing::info!(target: "graphql_server", "{line}"),
            LogLevel::Warn => tracing::warn!(target: "graphql_server", "{line}"),
            LogLevel::Error => tracing::error!(target: "graphql_server", "{line}"),
        }
    }

    pub fn debug(&self, message: &str) {
        self.log(LogEntryInput {
            message,
            level: LogLevel::Debug,
            ..Default::default()
        });
    }

    pub fn info(&self, message: &str) {
        self.log(LogEntryInput {
            message,
            level: LogLevel::Info,
            ..Default::default()
        });
    }

    pub fn warn(&self, message: &str) {
        self.log(LogEntryInput {
            message,
            level: LogLevel::Warn,
            ..Default::default()
        });
    }

    pub fn error(
        &self,
        message: &str,
        error: LoggedError<'_>,
        custom_error_name: Option<&str>,
        context_service_name: Option<&str>,
    ) {
        self.log(LogEntryInput {
            message,
            level: LogLevel::Error,
            error: Some(error),
            custom_error_name,
            context_service_name,
        });
    }
}

/// Redact values that may carry user data from a log message.
pub fn sanitize(message: &str) -> String {
    INVALID_VARIABLE_VALUE
        .replace_all(message, format!("got invalid value {SANITIZED_VALUE}; Field").as_str())
        .into_owned()
}

/// Shorten `message` to at most `limit` characters, ending with `marker`. A `limit` of 0 turns
/// truncation off.
pub fn truncate(message: String, limit: usize, marker: &str) -> String {
    if limit == 0 || message.chars().count() <= limit {
        return message;
    }
    let keep = limit.saturating_sub(marker.chars().count());
    let mut truncated: String = message.chars().take(keep).collect();
    truncated.push_str(marker);
    truncated
}
