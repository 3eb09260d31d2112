//! Tracing subscriber configuration.
//!
//! Logs are one JSON object per line. `RUST_LOG` overrides the filter; when it
//! is unset or unparseable the given default directive applies.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info";

/// Build the filter from `RUST_LOG`, falling back to `default_directive`.
pub fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(default_directive: &str) {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_directive))
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();

    if installed.is_ok() {
        ::tracing::debug!(default_filter = default_directive, "tracing initialised");
    }
}
