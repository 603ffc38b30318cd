//! Stage descriptors.
//!
//! A stage is a human readable description paired with a unit of work
//! operating on the builder that owns the pipeline.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use super::errors::StepResult;

/// Unit of work run by a stage against the builder state `S`.
pub type StageFn<S> = fn(&mut S) -> StepResult<()>;

/// A named unit of work in a pipeline.
pub struct Stage<S> {
    description: &'static str,
    work: StageFn<S>,
}

impl<S> Stage<S> {
    /// Create a new stage.
    pub fn new(description: &'static str, work: StageFn<S>) -> Self {
        Self { description, work }
    }

    /// Description reported when the stage completes.
    pub fn description(&self) -> &'static str {
        self.description
    }

    pub(crate) fn run(&self, state: &mut S) -> StepResult<()> {
        (self.work)(state)
    }
}

impl<S> fmt::Debug for Stage<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("description", &self.description)
            .finish()
    }
}

/// Completion record for one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    /// Description of the completed stage.
    pub description: &'static str,
    /// Wall-clock time the stage took.
    pub elapsed: Duration,
}

impl fmt::Display for StageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | Duration: {:.1}s",
            self.description,
            self.elapsed.as_secs_f64()
        )
    }
}
