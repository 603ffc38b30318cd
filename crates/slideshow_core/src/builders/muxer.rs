//! Final merge of video and audio with duration matching.
//!
//! The audio is repeated by doubling until it is at least as long as the
//! video, then cut at the video's duration. Doubling always terminates: a
//! non-positive starting duration is rejected and every pass must make the
//! audio strictly longer.

use std::fs;
use std::path::{Path, PathBuf};

use crate::commands::{ffmpeg, mkvmerge};
use crate::models::{Timecode, UnitKind};
use crate::pipeline::{PipelineError, PipelineResult, StepError, StepResult};
use crate::workspace::Workspace;

use super::Toolbox;

/// What a mux did.
#[derive(Debug, Clone, PartialEq)]
pub struct MuxReport {
    pub output: PathBuf,
    /// Probed video duration; `None` when the video was copied unchanged.
    pub video_secs: Option<f64>,
    /// Probed duration of the audio before doubling.
    pub audio_secs: Option<f64>,
    pub doublings: u32,
}

pub struct Muxer {
    toolbox: Toolbox,
    workspace: Workspace,
    counter: u32,
}

impl Muxer {
    pub fn new(toolbox: Toolbox, workdir: Option<&Path>) -> PipelineResult<Self> {
        let workspace = Workspace::create(workdir, UnitKind::Muxer)
            .map_err(|e| PipelineError::setup_failed(UnitKind::Muxer.name(), e.to_string()))?;
        Ok(Self {
            toolbox,
            workspace,
            counter: 1,
        })
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn into_workspace(self) -> Workspace {
        self.workspace
    }

    /// Write `output` from `video` and, if present, `audio`.
    ///
    /// Without an audio file the video container is copied byte for byte.
    pub fn mux(
        &mut self,
        video: &Path,
        audio: Option<&Path>,
        output: &Path,
    ) -> StepResult<MuxReport> {
        if output == video || Some(output) == audio {
            return Err(StepError::invalid_input(format!(
                "output {} would overwrite an input",
                output.display()
            )));
        }
        let audio = match audio {
            Some(a) if a.is_file() => a,
            Some(a) => {
                tracing::warn!("Audio file {} is missing, writing video only", a.display());
                return copy_video(video, output).map(|()| MuxReport::video_only(output));
            }
            None => return copy_video(video, output).map(|()| MuxReport::video_only(output)),
        };

        let video_secs = self.duration(video)?;
        if video_secs <= 0.0 {
            return Err(StepError::precondition_failed(format!(
                "video {} has no duration",
                video.display()
            )));
        }
        let initial = self.duration(audio)?;
        if initial <= 0.0 {
            return Err(StepError::precondition_failed(format!(
                "audio {} has no duration ({}s), it can never cover the video",
                audio.display(),
                initial
            )));
        }

        let mut current = audio.to_path_buf();
        let mut audio_secs = initial;
        let mut doublings = 0;
        while audio_secs < video_secs {
            let out = self.workspace.join(format!("audio-{:02}.mkv", self.counter));
            self.counter += 1;
            self.toolbox
                .run(&mkvmerge::double(&self.toolbox.executables, &current, &out))?;

            let doubled = self.duration(&out)?;
            if doubled <= audio_secs {
                return Err(StepError::precondition_failed(format!(
                    "doubling {} did not extend it ({}s -> {}s)",
                    current.display(),
                    audio_secs,
                    doubled
                )));
            }
            tracing::debug!("Doubled audio {:.2}s -> {:.2}s", audio_secs, doubled);
            audio_secs = doubled;
            current = out;
            doublings += 1;
        }

        let pattern = self.workspace.join("audio-cut-%02d.mkv");
        self.toolbox.run(&mkvmerge::split_at(
            &self.toolbox.executables,
            &current,
            Timecode::from_secs(video_secs),
            &pattern,
        ))?;
        let cut = self.workspace.join("audio-cut-01.mkv");
        if !cut.is_file() {
            return Err(StepError::file_not_found(&cut));
        }

        self.toolbox
            .run(&mkvmerge::merge(&self.toolbox.executables, video, &cut, output))?;

        Ok(MuxReport {
            output: output.to_path_buf(),
            video_secs: Some(video_secs),
            audio_secs: Some(initial),
            doublings,
        })
    }

    /// Probe a container's duration in seconds.
    ///
    /// `ffmpeg -i` without an output exits non-zero by design, so only the
    /// diagnostics are inspected.
    fn duration(&self, file: &Path) -> StepResult<f64> {
        let out = self
            .toolbox
            .runner
            .output(&ffmpeg::probe(&self.toolbox.executables, file))?;
        ffmpeg::parse_duration(&out.stderr)
    }
}

impl MuxReport {
    fn video_only(output: &Path) -> Self {
        Self {
            output: output.to_path_buf(),
            video_secs: None,
            audio_secs: None,
            doublings: 0,
        }
    }
}

/// Copy the video-only container to `output`.
pub fn copy_video(video: &Path, output: &Path) -> StepResult<()> {
    if !video.is_file() {
        return Err(StepError::file_not_found(video));
    }
    fs::copy(video, output).map_err(|e| StepError::io_error("copying video to output", e))?;
    Ok(())
}

/// Doubling passes needed for `audio` seconds to reach `video` seconds.
///
/// `None` when the audio duration is not positive or either value is not
/// finite, i.e. when doubling would never get there.
pub fn doublings_needed(video: f64, audio: f64) -> Option<u32> {
    if audio <= 0.0 || !audio.is_finite() || !video.is_finite() {
        return None;
    }
    let mut current = audio;
    let mut n = 0;
    while current < video {
        current *= 2.0;
        n += 1;
    }
    Some(n)
}
