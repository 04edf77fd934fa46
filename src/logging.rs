// ==========================================
// Logging setup
// ==========================================
// tracing + tracing-subscriber
// Level filter from the environment
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// Initialise logging
///
/// # Environment
/// - RUST_LOG: level filter (default: info)
///   e.g. RUST_LOG=debug or RUST_LOG=marking_maestro::engine=trace
///
/// # Example
/// ```no_run
/// use marking_maestro::logging;
/// logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();
}

/// Initialise logging as JSON lines (for piping CLI runs into log tooling)
pub fn init_json() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .json()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Logging for tests
///
/// Debug level, captured by the test harness. Safe to call repeatedly.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
