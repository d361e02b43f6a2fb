//! Tracing and logging setup shared by stockroom binaries.

/// Initialize process-wide logging from the environment.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init(&tracing::LogSettings::from_env());
}

/// Subscriber configuration (filter and output format).
pub mod tracing;

pub use self::tracing::{LogFormat, LogSettings};
