use super::LogFormatter;
use crate::logging::LogEntry;

#[derive(Debug, Default)]
pub(crate) struct Json;

impl LogFormatter for Json {
    fn format(&self, entry: &LogEntry) -> String {
        serde_json::to_string(entry).unwrap_or_else(|error| {
            serde_json::json!({
                "logger": entry.logger,
                "level": "ERROR",
                "message": format!("cannot serialize log entry: {error}"),
            })
            .to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;
    use serde_json::json;

    use super::*;
    use crate::logging::LogLevel;

    #[test]
    fn single_line_camel_case_object() {
        let entry = LogEntry {
            logger: "test-logger".to_string(),
            timestamp: "2024-03-01T10:00:00.000Z".to_string(),
            message: "line one\nline two".to_string(),
            level: LogLevel::Warn,
            service_name: "customer".to_string(),
            error_name: Some("FetchError".to_string()),
            stacktrace: None,
            query: Some("{ a }".to_string()),
        };

        let line = Json.format(&entry);

        assert!(!line.contains('\n'));
        assert_eq!(
            serde_json::from_str::<Value>(&line).unwrap(),
            json!({
                "logger": "test-logger",
                "timestamp": "2024-03-01T10:00:00.000Z",
                "message": "line one\nline two",
                "level": "WARN",
                "serviceName": "customer",
                "errorName": "FetchError",
                "query": "{ a }"
            })
        );
    }

    #[test]
    fn quotes_and_unicode_stay_valid_json() {
        let entry = LogEntry {
            logger: "api \"édition\" ☃".to_string(),
            timestamp: "2024-03-01T10:00:00.000Z".to_string(),
            message: "tab\there".to_string(),
            level: LogLevel::Error,
            service_name: "customer".to_string(),
            error_name: None,
            stacktrace: Some("Error: boom".to_string()),
            query: None,
        };

        let line: Value = serde_json::from_str(&Json.format(&entry)).unwrap();

        assert_eq!(line["logger"], "api \"édition\" ☃");
        assert_eq!(line["message"], "tab\there");
        assert_eq!(line["stacktrace"], "Error: boom");
    }
}
