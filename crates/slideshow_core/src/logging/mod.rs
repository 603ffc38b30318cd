//! Logging infrastructure.
//!
//! This module provides:
//! - A per-run logger with file + callback output
//! - A tail buffer of external tool output for error diagnosis
//! - Integration with the `tracing` ecosystem
//!
//! # Example
//!
//! ```no_run
//! use slideshow_core::logging::{LogConfig, RunLogger};
//!
//! let logger = RunLogger::new("holiday", Some("/tmp/logs".as_ref()), LogConfig::default(), None)
//!     .unwrap();
//! logger.phase("VideoBuilder");
//! logger.command("convert in.jpg -auto-orient out.jpg");
//! logger.success("Slideshow finished");
//! ```

mod run_logger;
mod types;

pub use run_logger::RunLogger;
pub use types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// Respects `RUST_LOG`, falling back to `default_level`, and writes to
/// stderr. Calling it twice is harmless; the second call is ignored.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter_str()));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .try_init();
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_is_harmless() {
        init_test_tracing();
        init_tracing(LogLevel::Debug);
    }
}
