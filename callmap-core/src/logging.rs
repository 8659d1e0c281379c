//! Structured logging using **tracing**.
//!
//! Every analysis stage emits `debug` events with its counts; collaborator
//! steps that are skipped or fail emit `warn`. The JSON subscriber provides
//! machine-readable output on stderr, keeping stdout for the report.

use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "warn";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// JSON subscriber writing to stderr, filtered by `RUST_LOG`.
fn json_subscriber() -> impl tracing::Subscriber + Send + Sync + 'static {
    tracing_subscriber::fmt()
        .json()
        .with_ansi(false)
        .with_level(true)
        .with_target(true)
        .with_current_span(true)
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .finish()
}

/// Initializes the global tracing subscriber with JSON output on stderr.
///
/// Call once at startup. A second call (or a subscriber installed elsewhere)
/// is reported as `false` instead of panicking.
///
/// # Environment Variables
/// - `RUST_LOG`: Controls log filtering (e.g., `RUST_LOG=callmap_core=debug`)
pub fn init_structured_logging() -> bool {
    json_subscriber().try_init().is_ok()
}
