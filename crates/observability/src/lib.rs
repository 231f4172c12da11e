//! Tracing/logging setup shared by embedding services and tests.

/// Initialize process-wide tracing with the default `info` filter.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init_with_filter("info");
}

/// Tracing configuration (filters, layers).
pub mod tracing;

pub use self::tracing::{init_test, init_with_filter, is_valid_filter};
