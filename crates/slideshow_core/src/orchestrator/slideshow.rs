//! Running the video and audio builders side by side and muxing the result.
//!
//! Each builder runs on its own thread and hands `(workspace, result)` back
//! over a single-slot channel. A panicking builder drops its sender, which
//! the orchestrator sees as a lost unit instead of blocking forever.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::builders::{AudioBuilder, MuxReport, Muxer, Toolbox, VideoBuilder, MIN_PICTURES};
use crate::logging::RunLogger;
use crate::models::UnitKind;
use crate::pipeline::{NoopObserver, PipelineError, PipelineResult, ProgressObserver};
use crate::tools::ToolRunner;
use crate::workspace::Workspace;

use super::errors::SlideshowError;
use super::options::{normalize_output, SlideshowOptions};

/// Longest wait on a unit's result before [`ProgressObserver::waiting`] is called.
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(200);

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct SlideshowReport {
    pub output: PathBuf,
    pub elapsed: Duration,
    pub mux: MuxReport,
    /// Workspaces left on disk (temp-file removal disabled or cleanup failed).
    pub kept_workspaces: Vec<PathBuf>,
}

/// A builder that can run on its own thread.
trait Unit: Send + 'static {
    const KIND: UnitKind;

    fn build(&mut self, observer: &dyn ProgressObserver) -> PipelineResult<PathBuf>;

    fn into_workspace(self) -> Workspace;
}

impl Unit for VideoBuilder {
    const KIND: UnitKind = UnitKind::Video;

    fn build(&mut self, observer: &dyn ProgressObserver) -> PipelineResult<PathBuf> {
        VideoBuilder::build(self, observer)
    }

    fn into_workspace(self) -> Workspace {
        VideoBuilder::into_workspace(self)
    }
}

impl Unit for AudioBuilder {
    const KIND: UnitKind = UnitKind::Audio;

    fn build(&mut self, observer: &dyn ProgressObserver) -> PipelineResult<PathBuf> {
        AudioBuilder::build(self, observer)
    }

    fn into_workspace(self) -> Workspace {
        AudioBuilder::into_workspace(self)
    }
}

type UnitOutcome = (Workspace, PipelineResult<PathBuf>);

/// State of the single-slot handoff from a unit thread.
enum Handoff {
    Pending,
    Received(UnitOutcome),
    Lost,
}

struct UnitHandle {
    kind: UnitKind,
    result: Receiver<UnitOutcome>,
    handoff: Handoff,
    thread: JoinHandle<()>,
}

impl UnitHandle {
    fn spawn<U: Unit>(
        mut unit: U,
        observer: Arc<dyn ProgressObserver>,
    ) -> Result<Self, SlideshowError> {
        let (tx, rx) = mpsc::sync_channel(1);
        let thread = thread::Builder::new()
            .name(U::KIND.name().to_lowercase())
            .spawn(move || {
                let result = unit.build(observer.as_ref());
                // The receiver only disappears if the orchestrator itself is gone.
                let _ = tx.send((unit.into_workspace(), result));
            })
            .map_err(|e| SlideshowError::io(format!("starting {}", U::KIND), e))?;
        Ok(Self {
            kind: U::KIND,
            result: rx,
            handoff: Handoff::Pending,
            thread,
        })
    }

    /// Block up to `timeout` for the unit's result. True once it is settled.
    fn wait(&mut self, timeout: Duration) -> bool {
        if !matches!(self.handoff, Handoff::Pending) {
            return true;
        }
        match self.result.recv_timeout(timeout) {
            Ok(outcome) => self.handoff = Handoff::Received(outcome),
            Err(RecvTimeoutError::Disconnected) => self.handoff = Handoff::Lost,
            Err(RecvTimeoutError::Timeout) => return false,
        }
        true
    }

    /// Receive the unit's result, keeping its workspace in `workspaces`.
    fn collect(mut self, workspaces: &mut Vec<Workspace>) -> Result<PathBuf, SlideshowError> {
        if matches!(self.handoff, Handoff::Pending) {
            self.handoff = match self.result.recv() {
                Ok(outcome) => Handoff::Received(outcome),
                Err(_) => Handoff::Lost,
            };
        }
        if self.thread.join().is_err() {
            tracing::error!("{} thread panicked", self.kind);
        }
        match self.handoff {
            Handoff::Received((workspace, result)) => {
                workspaces.push(workspace);
                Ok(result?)
            }
            Handoff::Pending | Handoff::Lost => Err(SlideshowError::WorkerLost(self.kind)),
        }
    }
}

/// Block until every unit has handed over its result.
///
/// Only the first pending unit is waited on with a timeout; the others are
/// checked without blocking, so a finished unit is noticed right away.
fn wait_for_units(units: &mut [&mut UnitHandle], observer: &dyn ProgressObserver) {
    loop {
        let mut timeout = PROGRESS_INTERVAL;
        let mut settled = true;
        for unit in units.iter_mut() {
            if !unit.wait(timeout) {
                settled = false;
                timeout = Duration::ZERO;
            }
        }
        if settled {
            return;
        }
        observer.waiting();
    }
}

/// Runs complete slideshows.
pub struct Orchestrator {
    runner: Arc<dyn ToolRunner>,
    observer: Arc<dyn ProgressObserver>,
    logger: Arc<RunLogger>,
    seed: Option<u64>,
    date: Option<NaiveDate>,
}

impl Orchestrator {
    pub fn new(runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            runner,
            observer: Arc::new(NoopObserver),
            logger: Arc::new(RunLogger::disabled()),
            seed: None,
            date: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_logger(mut self, logger: Arc<RunLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Seed the title collage selection.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Fix the date used for the credit line and tags.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Build a slideshow from `images` and optional `audio`.
    ///
    /// Workspaces are removed only after the output exists and only when
    /// `remove_tempfiles` is set. After a failure they are kept and logged.
    pub fn run(
        &self,
        images: Vec<PathBuf>,
        audio: Vec<PathBuf>,
        options: &SlideshowOptions,
    ) -> Result<SlideshowReport, SlideshowError> {
        let started = Instant::now();
        options.validate()?;
        if images.len() < MIN_PICTURES {
            return Err(PipelineError::validation_failed(
                UnitKind::Video.name(),
                format!(
                    "You must at least have {} pictures in your show (got {})",
                    MIN_PICTURES,
                    images.len()
                ),
            )
            .into());
        }
        let output = normalize_output(&options.output);
        let workdir = options.workdir.as_deref();
        let toolbox = Toolbox::new(options.executables.clone(), self.runner.clone());

        self.logger.phase("Building slideshow");
        self.logger.info(&format!(
            "{} pictures, {} audio files, profile {}, output {}",
            images.len(),
            audio.len(),
            options.profile,
            output.display()
        ));

        let mut video =
            VideoBuilder::new(images, options.video_options(), toolbox.clone(), workdir)?;
        if let Some(seed) = self.seed {
            video = video.with_rng(StdRng::seed_from_u64(seed));
        }
        if let Some(date) = self.date {
            video = video.with_date(date);
        }
        let audio_builder = if audio.is_empty() {
            None
        } else {
            match AudioBuilder::new(audio, options.audio_order, toolbox.clone(), workdir) {
                Ok(builder) => Some(builder),
                Err(e) => {
                    self.clean_up(vec![video.into_workspace()]);
                    return Err(e.into());
                }
            }
        };

        let mut video_handle = UnitHandle::spawn(video, self.observer.clone())?;
        let mut audio_handle = match audio_builder {
            Some(builder) => {
                let audio_root = builder.workspace().root().to_path_buf();
                match UnitHandle::spawn(builder, self.observer.clone()) {
                    Ok(handle) => Some(handle),
                    Err(e) => {
                        self.logger
                            .warn(&format!("Keeping workspace {}", audio_root.display()));
                        return Err(self.abandon_started(video_handle, e));
                    }
                }
            }
            None => None,
        };

        match audio_handle.as_mut() {
            Some(audio) => wait_for_units(&mut [&mut video_handle, audio], self.observer.as_ref()),
            None => wait_for_units(&mut [&mut video_handle], self.observer.as_ref()),
        }

        let mut workspaces = Vec::new();
        let video_result = video_handle.collect(&mut workspaces);
        let audio_result = audio_handle
            .map(|h| h.collect(&mut workspaces))
            .transpose();

        let (video_file, audio_file) = match (video_result, audio_result) {
            (Ok(video), Ok(audio)) => (video, audio),
            (Err(e), audio) => {
                if let Err(audio_err) = audio {
                    tracing::error!("{}", audio_err);
                    self.logger.error(&audio_err.to_string());
                }
                return Err(self.abandon(e, &workspaces));
            }
            (Ok(_), Err(e)) => return Err(self.abandon(e, &workspaces)),
        };

        let mut muxer = match Muxer::new(toolbox, workdir) {
            Ok(m) => m,
            Err(e) => return Err(self.abandon(e.into(), &workspaces)),
        };
        let mux = muxer.mux(&video_file, audio_file.as_deref(), &output);
        workspaces.push(muxer.into_workspace());
        let mux = match mux {
            Ok(report) => report,
            Err(e) => return Err(self.abandon(SlideshowError::Mux(e), &workspaces)),
        };

        let kept_workspaces = if options.remove_tempfiles {
            self.clean_up(workspaces)
        } else {
            workspaces.iter().map(|w| w.root().to_path_buf()).collect()
        };

        let elapsed = started.elapsed();
        self.observer.run_finished(&output, elapsed);
        Ok(SlideshowReport {
            output,
            elapsed,
            mux,
            kept_workspaces,
        })
    }

    /// Let an already started unit finish, then fail with `error`.
    fn abandon_started(&self, started: UnitHandle, error: SlideshowError) -> SlideshowError {
        let mut workspaces = Vec::new();
        if let Err(unit_err) = started.collect(&mut workspaces) {
            tracing::error!("{}", unit_err);
            self.logger.error(&unit_err.to_string());
        }
        self.abandon(error, &workspaces)
    }

    /// Log the failure and where its files were left.
    fn abandon(&self, error: SlideshowError, workspaces: &[Workspace]) -> SlideshowError {
        tracing::error!("{}", error);
        self.logger.error(&error.to_string());
        for workspace in workspaces {
            self.logger
                .warn(&format!("Keeping workspace {}", workspace.root().display()));
        }
        error
    }

    /// Remove every workspace; failures only warn. Returns what is left.
    fn clean_up(&self, workspaces: Vec<Workspace>) -> Vec<PathBuf> {
        let mut kept = Vec::new();
        for workspace in workspaces {
            let root = workspace.root().to_path_buf();
            if let Err(e) = workspace.cleanup() {
                tracing::warn!("Could not remove {}: {}", root.display(), e);
                self.logger
                    .warn(&format!("Could not remove {}: {}", root.display(), e));
                kept.push(root);
            }
        }
        kept
    }
}

/// Build a slideshow with the default observer and logger.
pub fn slideshow(
    runner: Arc<dyn ToolRunner>,
    images: Vec<PathBuf>,
    audio: Vec<PathBuf>,
    options: &SlideshowOptions,
) -> Result<SlideshowReport, SlideshowError> {
    Orchestrator::new(runner).run(images, audio, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::slots;
    use crate::pipeline::{StageReport, StepResult};
    use crate::tools::fake::{read_duration, write_media, FakeRunner};
    use crate::tools::{Invocation, Tool, ToolOutput};
    use parking_lot::Mutex;
    use std::fs;
    use std::path::Path;
    use tempfile::{tempdir, TempDir};

    fn images(dir: &TempDir, n: usize) -> Vec<PathBuf> {
        let src = dir.path().join("photos");
        fs::create_dir_all(&src).unwrap();
        (0..n)
            .map(|i| {
                let p = src.join(format!("img-{i}.jpg"));
                fs::write(&p, "jpeg").unwrap();
                p
            })
            .collect()
    }

    fn options(dir: &TempDir) -> SlideshowOptions {
        SlideshowOptions {
            output: dir.path().join("show"),
            workdir: Some(dir.path().join("work")),
            ..SlideshowOptions::default()
        }
    }

    fn orchestrator(runner: Arc<dyn ToolRunner>) -> Orchestrator {
        Orchestrator::new(runner)
            .with_seed(3)
            .with_date(NaiveDate::from_ymd_opt(2024, 12, 24).unwrap())
    }

    fn workspaces_left(dir: &TempDir) -> usize {
        match fs::read_dir(dir.path().join("work")) {
            Ok(entries) => entries
                .filter(|e| {
                    e.as_ref()
                        .unwrap()
                        .file_name()
                        .to_string_lossy()
                        .starts_with("slideshow-")
                })
                .count(),
            Err(_) => 0,
        }
    }

    #[test]
    fn four_images_without_audio() {
        let dir = tempdir().unwrap();
        let runner = Arc::new(FakeRunner::new());

        let report = orchestrator(runner.clone())
            .run(images(&dir, 4), Vec::new(), &options(&dir))
            .unwrap();

        assert_eq!(report.output, dir.path().join("show.mkv"));
        assert!(report.output.is_file());
        assert_eq!(report.mux.doublings, 0);
        assert!(report.kept_workspaces.is_empty());
        assert_eq!(workspaces_left(&dir), 0);

        let tokens = &runner.option_files()[0];
        let order: Vec<u32> = tokens
            .iter()
            .filter(|t| t.contains("mov-pic-"))
            .map(|t| {
                let name = Path::new(t.trim_start_matches('+')).file_name().unwrap();
                slots::slot_from_name(&name.to_string_lossy()).unwrap()
            })
            .collect();
        assert_eq!(order, (1..=11).collect::<Vec<u32>>());
    }

    #[test]
    fn audio_is_stretched_to_video_length() {
        let dir = tempdir().unwrap();
        let runner = Arc::new(FakeRunner::new());
        let a = dir.path().join("a.aac");
        let b = dir.path().join("b.aac");
        write_media(&a, 4.0);
        write_media(&b, 3.0);

        let report = orchestrator(runner.clone())
            .run(images(&dir, 4), vec![a, b], &options(&dir))
            .unwrap();

        // 7 + 4 * 5 + 7 seconds of pictures plus five 1 second transitions.
        assert_eq!(report.mux.video_secs, Some(39.0));
        assert_eq!(report.mux.audio_secs, Some(7.0));
        assert_eq!(report.mux.doublings, 3);
        assert_eq!(read_duration(&report.output), Some(39.0));
        assert_eq!(workspaces_left(&dir), 0);
    }

    #[test]
    fn kept_workspaces_are_reported() {
        let dir = tempdir().unwrap();
        let audio = dir.path().join("song.m4a");
        write_media(&audio, 60.0);
        let options = SlideshowOptions {
            remove_tempfiles: false,
            ..options(&dir)
        };

        let report = orchestrator(Arc::new(FakeRunner::new()))
            .run(images(&dir, 5), vec![audio], &options)
            .unwrap();
        assert_eq!(report.kept_workspaces.len(), 3);
        assert!(report.kept_workspaces.iter().all(|w| w.is_dir()));
        assert_eq!(workspaces_left(&dir), 3);
    }

    #[test]
    fn too_few_images_runs_nothing() {
        let dir = tempdir().unwrap();
        let runner = Arc::new(FakeRunner::new());

        let err = orchestrator(runner.clone())
            .run(images(&dir, 3), Vec::new(), &options(&dir))
            .unwrap_err();
        assert!(matches!(
            err,
            SlideshowError::Pipeline(PipelineError::ValidationFailed { .. })
        ));
        assert!(runner.calls().is_empty());
        assert_eq!(workspaces_left(&dir), 0);
    }

    #[test]
    fn tool_failure_surfaces_and_keeps_files() {
        let dir = tempdir().unwrap();
        let audio = dir.path().join("a.aac");
        write_media(&audio, 10.0);

        let err = orchestrator(Arc::new(FakeRunner::failing(Tool::Mkvmerge)))
            .run(images(&dir, 4), vec![audio], &options(&dir))
            .unwrap_err();
        match err {
            SlideshowError::Pipeline(PipelineError::StepFailed { stage, .. }) => {
                assert_eq!(stage, "Created video only MKV file");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(workspaces_left(&dir), 2);
        assert!(!dir.path().join("show.mkv").exists());
    }

    /// Panics on audio transcodes, delegates everything else.
    struct PanicOnTranscode(FakeRunner);

    impl ToolRunner for PanicOnTranscode {
        fn output(&self, invocation: &Invocation) -> StepResult<ToolOutput> {
            if invocation.arg_strings().iter().any(|a| a == "-c:a") {
                panic!("transcoder crashed");
            }
            self.0.output(invocation)
        }
    }

    #[test]
    fn panicking_unit_is_reported_not_awaited() {
        let dir = tempdir().unwrap();
        let audio = dir.path().join("a.mp3");
        write_media(&audio, 10.0);

        let err = orchestrator(Arc::new(PanicOnTranscode(FakeRunner::new())))
            .run(images(&dir, 4), vec![audio], &options(&dir))
            .unwrap_err();
        assert!(matches!(err, SlideshowError::WorkerLost(UnitKind::Audio)));
    }

    #[derive(Default)]
    struct Recorder {
        stages: Mutex<Vec<(UnitKind, &'static str)>>,
        finished: Mutex<Vec<PathBuf>>,
    }

    impl ProgressObserver for Recorder {
        fn stage_finished(&self, unit: UnitKind, report: &StageReport) {
            self.stages.lock().push((unit, report.description));
        }

        fn run_finished(&self, output: &Path, _elapsed: Duration) {
            self.finished.lock().push(output.to_path_buf());
        }
    }

    #[test]
    fn observer_sees_every_stage() {
        let dir = tempdir().unwrap();
        let audio = dir.path().join("a.wav");
        write_media(&audio, 90.0);
        let recorder = Arc::new(Recorder::default());

        orchestrator(Arc::new(FakeRunner::new()))
            .with_observer(recorder.clone())
            .run(images(&dir, 4), vec![audio], &options(&dir))
            .unwrap();

        let stages = recorder.stages.lock();
        let count = |kind| stages.iter().filter(|(u, _)| *u == kind).count();
        assert_eq!(count(UnitKind::Video), 7);
        assert_eq!(count(UnitKind::Audio), 2);
        assert_eq!(*recorder.finished.lock(), vec![dir.path().join("show.mkv")]);
    }

    fn video_unit(dir: &TempDir, runner: Arc<dyn ToolRunner>) -> UnitHandle {
        let opts = options(dir);
        let video = VideoBuilder::new(
            images(dir, 4),
            opts.video_options(),
            Toolbox::new(opts.executables.clone(), runner),
            opts.workdir.as_deref(),
        )
        .unwrap();
        UnitHandle::spawn(video, Arc::new(NoopObserver)).unwrap()
    }

    #[test]
    fn finished_unit_wakes_the_wait_at_once() {
        let dir = tempdir().unwrap();
        let mut handle = video_unit(&dir, Arc::new(FakeRunner::new()));

        let started = Instant::now();
        assert!(handle.wait(Duration::from_secs(60)));
        assert!(started.elapsed() < Duration::from_secs(30));
        assert!(handle.wait(Duration::ZERO));

        let mut workspaces = Vec::new();
        let out = handle.collect(&mut workspaces).unwrap();
        assert_eq!(workspaces.len(), 1);
        assert!(out.starts_with(workspaces[0].root()));
    }

    struct SlowMerge(FakeRunner);

    impl ToolRunner for SlowMerge {
        fn output(&self, invocation: &Invocation) -> StepResult<ToolOutput> {
            if invocation.tool == Tool::Mkvmerge {
                std::thread::sleep(PROGRESS_INTERVAL * 2);
            }
            self.0.output(invocation)
        }
    }

    #[derive(Default)]
    struct WaitCounter(std::sync::atomic::AtomicUsize);

    impl ProgressObserver for WaitCounter {
        fn waiting(&self) {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
    }

    #[test]
    fn slow_units_report_progress_while_waiting() {
        let dir = tempdir().unwrap();
        let audio = dir.path().join("a.aac");
        write_media(&audio, 50.0);
        let counter = Arc::new(WaitCounter::default());

        orchestrator(Arc::new(SlowMerge(FakeRunner::new())))
            .with_observer(counter.clone())
            .run(images(&dir, 4), vec![audio], &options(&dir))
            .unwrap();

        assert!(counter.0.load(std::sync::atomic::Ordering::SeqCst) >= 1);
    }

    #[test]
    fn failed_audio_start_still_collects_video() {
        let dir = tempdir().unwrap();
        let orch = orchestrator(Arc::new(FakeRunner::new()));
        let handle = video_unit(&dir, Arc::new(FakeRunner::new()));

        let err = orch.abandon_started(
            handle,
            SlideshowError::io("starting Audio", std::io::Error::other("no threads left")),
        );

        assert!(matches!(err, SlideshowError::Io { .. }));
        assert_eq!(workspaces_left(&dir), 1);
        let work = fs::read_dir(dir.path().join("work"))
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
            .path();
        assert!(work.join("video_only.mkv").is_file());
    }
}
