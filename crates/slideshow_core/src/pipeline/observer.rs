//! Progress observers.
//!
//! Observers are called from the worker threads as stages complete, so they
//! must be `Send + Sync`. All methods default to doing nothing.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::logging::RunLogger;
use crate::models::{Timecode, UnitKind};

use super::stage::StageReport;

/// Receives progress events of a slideshow run.
pub trait ProgressObserver: Send + Sync {
    /// A stage of `unit` finished.
    fn stage_finished(&self, _unit: UnitKind, _report: &StageReport) {}

    /// Every stage of `unit` finished.
    fn unit_finished(&self, _unit: UnitKind, _elapsed: Duration) {}

    /// Called after each interval in which no builder finished.
    fn waiting(&self) {}

    /// The final output was written.
    fn run_finished(&self, _output: &Path, _elapsed: Duration) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {}

/// Forwards progress to `tracing` and the run log.
pub struct LoggingObserver {
    logger: Arc<RunLogger>,
}

impl LoggingObserver {
    pub fn new(logger: Arc<RunLogger>) -> Self {
        Self { logger }
    }
}

impl ProgressObserver for LoggingObserver {
    fn stage_finished(&self, unit: UnitKind, report: &StageReport) {
        tracing::info!("[{}] {}", unit, report);
        self.logger.info(&format!("[{}] {}", unit, report));
    }

    fn unit_finished(&self, unit: UnitKind, elapsed: Duration) {
        let msg = format!("{} finished in {:.1}s", unit, elapsed.as_secs_f64());
        tracing::debug!("{}", msg);
        self.logger.success(&msg);
    }

    fn run_finished(&self, output: &Path, elapsed: Duration) {
        let msg = format!(
            "Wrote {} | Duration of the whole process: {}",
            output.display(),
            Timecode::from(elapsed).whole_seconds()
        );
        tracing::info!("{}", msg);
        self.logger.success(&msg);
    }
}
