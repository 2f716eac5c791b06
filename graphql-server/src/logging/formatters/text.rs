use super::LogFormatter;
use crate::logging::LogEntry;

#[derive(Debug, Default)]
pub(crate) struct Text;

impl LogFormatter for Text {
    fn format(&self, entry: &LogEntry) -> String {
        let mut line = format!(
            "{} [{}]{}-{} :{}",
            entry.timestamp, entry.level, entry.logger, entry.service_name, entry.message
        );
        if let Some(stacktrace) = &entry.stacktrace {
            line.push(' ');
            line.push_str(stacktrace);
        }
        line
    }
}
