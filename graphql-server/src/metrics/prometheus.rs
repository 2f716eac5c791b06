use ::prometheus::Encoder;
use ::prometheus::IntCounter;
use ::prometheus::IntCounterVec;
use ::prometheus::IntGauge;
use ::prometheus::Opts;
use ::prometheus::Registry;
use ::prometheus::TextEncoder;
use strum::IntoEnumIterator;

use super::MetricsClient;
use crate::error::ErrorCategory;

const AVAILABILITY: &str = "graphql_server_availability";
const REQUEST_THROUGHPUT: &str = "graphql_server_request_throughput";
const ERRORS: &str = "graphql_server_errors";
const ERROR_CLASS_LABEL: &str = "errorClass";

/// A [`MetricsClient`] backed by its own prometheus [`Registry`].
#[derive(Clone)]
pub struct PrometheusMetricsClient {
    registry: Registry,
    availability: IntGauge,
    request_throughput: IntCounter,
    errors: IntCounterVec,
}

impl PrometheusMetricsClient {
    pub fn new() -> Result<Self, ::prometheus::Error> {
        let availability = IntGauge::new(AVAILABILITY, "GraphQL server availability")?;
        let request_throughput = IntCounter::new(REQUEST_THROUGHPUT, "Number of incoming requests")?;
        let errors = IntCounterVec::new(
            Opts::new(ERRORS, "Number of errors per Error class"),
            &[ERROR_CLASS_LABEL],
        )?;

        let registry = Registry::new();
        registry.register(Box::new(availability.clone()))?;
        registry.register(Box::new(request_throughput.clone()))?;
        registry.register(Box::new(errors.clone()))?;

        let client = Self {
            registry,
            availability,
            request_throughput,
            errors,
        };
        client.init();
        Ok(client)
    }

    /// The registry the metrics are registered in, to add more collectors to it.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl MetricsClient for PrometheusMetricsClient {
    fn init(&self) {
        self.availability.set(1);
        self.request_throughput.reset();
        self.errors.reset();
        // every series exists from the first scrape so rate() has a baseline
        for category in ErrorCategory::iter() {
            self.errors.with_label_values(&[category.as_str()]);
        }
    }

    fn increase_request_throughput(&self) {
        self.request_throughput.inc();
    }

    fn increase_errors(&self, category: ErrorCategory) {
        self.errors.with_label_values(&[category.as_str()]).inc();
    }

    fn set_availability(&self, available: bool) {
        self.availability.set(i64::from(available));
    }

    fn metrics(&self) -> String {
        let mut buffer = Vec::new();
        if let Err(error) = TextEncoder::new().encode(&self.registry.gather(), &mut buffer) {
            tracing::error!("cannot encode metrics: {error}");
            return String::new();
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_line(category: ErrorCategory, value: u64) -> String {
        format!("graphql_server_errors{{errorClass=\"{category}\"}} {value}")
    }

    #[test]
    fn initial_state() {
        let client = PrometheusMetricsClient::new().unwrap();
        let metrics = client.metrics();

        assert!(metrics.contains("# HELP graphql_server_availability GraphQL server availability"));
        assert!(metrics.contains("# TYPE graphql_server_availability gauge"));
        assert!(metrics.contains("\ngraphql_server_availability 1\n"));
        assert!(metrics.contains("# TYPE graphql_server_request_throughput counter"));
        assert!(metrics.contains("\ngraphql_server_request_throughput 0\n"));
        assert!(metrics.contains("# HELP graphql_server_errors Number of errors per Error class"));
        assert!(metrics.contains("# TYPE graphql_server_errors counter"));
        for category in ErrorCategory::iter() {
            assert!(metrics.contains(&error_line(category, 0)), "{category} missing");
        }
    }

    #[test]
    fn counts_requests_and_errors() {
        let client = PrometheusMetricsClient::new().unwrap();
        client.increase_request_throughput();
        client.increase_errors(ErrorCategory::GraphqlError);
        client.increase_errors_by_label("FETCH_ERROR");
        client.increase_errors_by_label("FETCH_ERROR");

        let metrics = client.metrics();

        assert!(metrics.contains("\ngraphql_server_request_throughput 1\n"));
        assert!(metrics.contains(&error_line(ErrorCategory::GraphqlError, 1)));
        assert!(metrics.contains(&error_line(ErrorCategory::FetchError, 2)));
        assert!(metrics.contains(&error_line(ErrorCategory::SyntaxError, 0)));
    }

    #[test]
    fn extra_collectors_are_rendered() {
        let client = PrometheusMetricsClient::new().unwrap();
        let cache_hits = IntCounter::new("graphql_server_cache_hits", "Cache hits").unwrap();
        client
            .registry()
            .register(Box::new(cache_hits.clone()))
            .unwrap();
        cache_hits.inc_by(3);

        let metrics = client.metrics();
        assert!(metrics.contains("\ngraphql_server_cache_hits 3\n"));
        assert!(metrics.contains("\ngraphql_server_request_throughput 0\n"));
    }

    #[test]
    fn unknown_labels_are_ignored() {
        let client = PrometheusMetricsClient::new().unwrap();
        let before = client.metrics();

        client.increase_errors_by_label("SOMETHING_ELSE");
        client.increase_errors_by_label("");

        assert_eq!(client.metrics(), before);
    }

    #[test]
    fn availability_gauge() {
        let client = PrometheusMetricsClient::new().unwrap();
        client.set_availability(false);
        assert!(client.metrics().contains("\ngraphql_server_availability 0\n"));
        client.set_availability(true);
        assert!(client.metrics().contains("\ngraphql_server_availability 1\n"));
    }

    #[test]
    fn init_resets_everything() {
        let client = PrometheusMetricsClient::new().unwrap();
        client.increase_request_throughput();
        client.increase_errors(ErrorCategory::ValidationError);
        client.set_availability(false);

        client.init();

        let metrics = client.metrics();
        assert!(metrics.contains("\ngraphql_server_request_throughput 0\n"));
        assert!(metrics.contains("\ngraphql_server_availability 1\n"));
        for category in ErrorCategory::iter() {
            assert!(metrics.contains(&error_line(category, 0)));
        }
    }

    #[test]
    fn clients_do_not_share_state() {
        let first = PrometheusMetricsClient::new().unwrap();
        let second = PrometheusMetricsClient::new().unwrap();
        first.increase_request_throughput();
        assert!(second.metrics().contains("\ngraphql_server_request_throughput 0\n"));
    }
}
