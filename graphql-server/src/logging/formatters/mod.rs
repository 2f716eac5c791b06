//! Our formatters used for logging
pub(crate) mod json;
pub(crate) mod text;

use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;

use super::LogEntry;

/// Turns a [`LogEntry`] into the single line that gets emitted.
pub(crate) trait LogFormatter: Send + Sync {
    fn format(&self, entry: &LogEntry) -> String;
}

/// Log line format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// `<timestamp> [<LEVEL>]<logger>-<service> :<message> <stacktrace>`
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    pub(crate) fn formatter(self) -> Box<dyn LogFormatter> {
        match self {
            LogFormat::Text => Box::new(text::Text),
            LogFormat::Json => Box::new(json::Json),
        }
    }
}
