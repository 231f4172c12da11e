//! Tracing/logging initialization.
//!
//! Services get JSON lines on stdout; tests get plain output routed through
//! the test harness so it only shows for failing tests.

use tracing_subscriber::EnvFilter;

/// Filter from `RUST_LOG`, falling back to `default_filter` and then `info`.
fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Whether `directive` parses as an `EnvFilter` directive string.
pub fn is_valid_filter(directive: &str) -> bool {
    EnvFilter::try_new(directive).is_ok()
}

/// Initialize JSON tracing for the process.
///
/// `default_filter` (e.g. `RolegateConfig::log_filter`) applies when
/// `RUST_LOG` is unset. Safe to call multiple times (subsequent calls are
/// no-ops).
pub fn init_with_filter(default_filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_filter))
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}

/// Initialize human-readable tracing captured by the test harness.
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter("debug"))
        .with_test_writer()
        .try_init();
}
