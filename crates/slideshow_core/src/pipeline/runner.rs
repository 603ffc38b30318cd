//! Pipeline runner that executes stages in sequence.

use std::iter::FusedIterator;
use std::slice;
use std::time::{Duration, Instant};

use super::errors::{PipelineError, PipelineResult, StepResult};
use super::stage::{Stage, StageFn, StageReport};

/// Ordered list of stages owned by one unit of work.
///
/// Stages run strictly in order on the calling thread. Running a pipeline
/// yields one [`StageReport`] per completed stage, so callers can observe
/// progress while later stages are still pending.
pub struct Pipeline<S> {
    /// Name of the unit running this pipeline (for error context).
    unit: String,
    /// Stages to execute in order.
    stages: Vec<Stage<S>>,
}

impl<S> Pipeline<S> {
    /// Create a new empty pipeline.
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            stages: Vec::new(),
        }
    }

    /// Add a stage to the pipeline.
    pub fn add_stage(&mut self, description: &'static str, work: StageFn<S>) -> &mut Self {
        self.stages.push(Stage::new(description, work));
        self
    }

    /// Add a stage (builder pattern).
    pub fn with_stage(mut self, description: &'static str, work: StageFn<S>) -> Self {
        self.add_stage(description, work);
        self
    }

    /// Name of the owning unit.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Get the number of stages in the pipeline.
    pub fn step_count(&self) -> usize {
        self.stages.len()
    }

    /// Get stage descriptions in order.
    pub fn descriptions(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.description()).collect()
    }

    /// Start running the pipeline against `state`.
    ///
    /// Nothing executes until the returned iterator is advanced.
    pub fn run<'a>(&'a self, state: &'a mut S) -> PipelineRun<'a, S> {
        PipelineRun {
            unit: &self.unit,
            stages: self.stages.iter(),
            state,
            started: None,
            total: None,
            halted: false,
        }
    }
}

/// A pipeline in progress.
///
/// Each call to `next` runs exactly one stage. After a stage fails the
/// error is yielded once and the iterator is exhausted; later stages never
/// run.
pub struct PipelineRun<'a, S> {
    unit: &'a str,
    stages: slice::Iter<'a, Stage<S>>,
    state: &'a mut S,
    started: Option<Instant>,
    total: Option<Duration>,
    halted: bool,
}

impl<S> PipelineRun<'_, S> {
    /// Total wall-clock duration, available once every stage has completed.
    pub fn total_duration(&self) -> Option<Duration> {
        self.total
    }

    /// Run all remaining stages, calling `observe` after each one.
    ///
    /// Returns the total duration, or the first stage failure.
    pub fn finish_with<F>(mut self, mut observe: F) -> PipelineResult<Duration>
    where
        F: FnMut(&StageReport),
    {
        for report in &mut self {
            observe(&report?);
        }
        Ok(self.total.unwrap_or_default())
    }

    /// Run all remaining stages without observing them.
    pub fn finish(self) -> PipelineResult<Duration> {
        self.finish_with(|_| {})
    }

    fn run_stage(&mut self, stage: &Stage<S>) -> StepResult<Duration> {
        let start = Instant::now();
        tracing::debug!(unit = self.unit, stage = stage.description(), "running stage");
        stage.run(self.state)?;
        Ok(start.elapsed())
    }
}

impl<S> Iterator for PipelineRun<'_, S> {
    type Item = PipelineResult<StageReport>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.halted {
            return None;
        }
        let started = *self.started.get_or_insert_with(Instant::now);

        let Some(stage) = self.stages.next() else {
            self.halted = true;
            self.total = Some(started.elapsed());
            return None;
        };

        match self.run_stage(stage) {
            Ok(elapsed) => Some(Ok(StageReport {
                description: stage.description(),
                elapsed,
            })),
            Err(e) => {
                self.halted = true;
                tracing::error!(unit = self.unit, stage = stage.description(), "{}", e);
                Some(Err(PipelineError::step_failed(
                    self.unit,
                    stage.description(),
                    e,
                )))
            }
        }
    }
}

impl<S> FusedIterator for PipelineRun<'_, S> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::errors::StepError;

    #[derive(Default)]
    struct Recorder {
        log: Vec<&'static str>,
    }

    fn first(r: &mut Recorder) -> StepResult<()> {
        r.log.push("first");
        Ok(())
    }

    fn second(r: &mut Recorder) -> StepResult<()> {
        r.log.push("second");
        Ok(())
    }

    fn failing(r: &mut Recorder) -> StepResult<()> {
        r.log.push("failing");
        Err(StepError::command_failed("convert", 1, "boom"))
    }

    fn pipeline() -> Pipeline<Recorder> {
        Pipeline::new("Test")
            .with_stage("First", first)
            .with_stage("Second", second)
    }

    #[test]
    fn pipeline_builds_correctly() {
        let p = pipeline();
        assert_eq!(p.step_count(), 2);
        assert_eq!(p.descriptions(), vec!["First", "Second"]);
        assert_eq!(p.unit(), "Test");
    }

    #[test]
    fn stages_run_lazily_and_in_order() {
        let p = pipeline();
        let mut state = Recorder::default();
        let mut run = p.run(&mut state);

        let report = run.next().unwrap().unwrap();
        assert_eq!(report.description, "First");
        assert!(run.total_duration().is_none());

        let report = run.next().unwrap().unwrap();
        assert_eq!(report.description, "Second");
        assert!(run.next().is_none());
        assert!(run.total_duration().is_some());
        drop(run);

        assert_eq!(state.log, vec!["first", "second"]);
    }

    #[test]
    fn failure_stops_later_stages() {
        let p = Pipeline::new("Test")
            .with_stage("First", first)
            .with_stage("Failing", failing)
            .with_stage("Second", second);
        let mut state = Recorder::default();

        let err = p.run(&mut state).finish().unwrap_err();
        assert_eq!(err.stage(), Some("Failing"));
        assert_eq!(state.log, vec!["first", "failing"]);
    }

    #[test]
    fn error_is_yielded_once() {
        let p = Pipeline::new("Test").with_stage("Failing", failing);
        let mut state = Recorder::default();
        let mut run = p.run(&mut state);

        assert!(run.next().unwrap().is_err());
        assert!(run.next().is_none());
        assert!(run.total_duration().is_none());
    }

    #[test]
    fn finish_with_observes_every_stage() {
        let p = pipeline();
        let mut state = Recorder::default();
        let mut seen = Vec::new();

        p.run(&mut state)
            .finish_with(|r| seen.push(r.description))
            .unwrap();
        assert_eq!(seen, vec!["First", "Second"]);
    }
}
