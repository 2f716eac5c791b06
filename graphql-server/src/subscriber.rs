//! Process-wide `tracing` subscriber.
use tower::BoxError;
use tracing_subscriber::EnvFilter;

/// Directives used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info";

/// Install a subscriber printing every event's message as is, one per line on stdout.
///
/// Log entries are formatted by the [`Logger`](crate::logging::Logger) before they are emitted,
/// so the subscriber adds no timestamp, level or target of its own. Fails if a global subscriber
/// is already installed.
pub fn init() -> Result<(), BoxError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .without_time()
        .with_level(false)
        .with_target(false)
        .try_init()
}
