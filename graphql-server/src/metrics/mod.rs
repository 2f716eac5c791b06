//! Request, availability and error metrics.
//!
//! The server owns one [`MetricsClient`]; nothing here is a process-wide singleton.
mod prometheus;

use std::str::FromStr;

pub use self::prometheus::PrometheusMetricsClient;
use crate::error::ErrorCategory;

/// Content type of the text exposition format served at the metrics endpoint.
pub const METRICS_CONTENT_TYPE: &str = "text/plain; charset=utf-8; version=0.0.4";

/// Counters updated while handling requests.
///
/// Implementations must be safe to update from concurrent requests.
pub trait MetricsClient: Send + Sync {
    /// Reset every series to its initial value: counters at zero, one error series per
    /// [`ErrorCategory`], availability at 1.
    fn init(&self);

    /// Count one inbound request, whatever its outcome.
    fn increase_request_throughput(&self);

    /// Count one error of the given category.
    fn increase_errors(&self, category: ErrorCategory);

    /// Count one error by its category label. Unknown labels are ignored.
    fn increase_errors_by_label(&self, label: &str) {
        match ErrorCategory::from_str(label) {
            Ok(category) => self.increase_errors(category),
            Err(_) => tracing::debug!("ignoring unknown error category {label}"),
        }
    }

    /// Record whether the server can currently serve requests.
    fn set_availability(&self, available: bool);

    /// Render all metrics in the text exposition format.
    fn metrics(&self) -> String;

    fn content_type(&self) -> &'static str {
        METRICS_CONTENT_TYPE
    }
}

/// A [`MetricsClient`] that records nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoMetricsClient;

impl MetricsClient for NoMetricsClient {
    fn init(&self) {}

    fn increase_request_throughput(&self) {}

    fn increase_errors(&self, _category: ErrorCategory) {}

    fn set_availability(&self, _available: bool) {}

    fn metrics(&self) -> String {
        String::new()
    }
}
