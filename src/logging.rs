//! Logging configuration for `cmdeng`.
//!
//! Logs go to stderr so they never mix with command output on stdout.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "warn";

/// Initializes logging to stderr.
///
/// The filter is taken from `RUST_LOG`, falling back to [`DEFAULT_FILTER`].
pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter())
        .with_writer(std::io::stderr)
        .init();
}

fn build_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
