//! Audio builder: audio files to an audio-only Matroska file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::commands::{ffmpeg, OptionFileBuilder};
use crate::models::{AudioOrder, UnitKind};
use crate::pipeline::{
    Pipeline, PipelineError, PipelineResult, ProgressObserver, StepError, StepResult,
};
use crate::workspace::Workspace;

use super::Toolbox;

/// Extensions copied verbatim instead of transcoded.
pub const AAC_EXTENSIONS: [&str; 2] = ["aac", "m4a"];

/// Builds the audio-only container of a show.
pub struct AudioBuilder {
    inputs: Vec<PathBuf>,
    order: AudioOrder,
    toolbox: Toolbox,
    workspace: Workspace,
    aac_files: Vec<PathBuf>,
    output: Option<PathBuf>,
}

impl AudioBuilder {
    pub fn new(
        inputs: Vec<PathBuf>,
        order: AudioOrder,
        toolbox: Toolbox,
        workdir: Option<&Path>,
    ) -> PipelineResult<Self> {
        let workspace = Workspace::create(workdir, UnitKind::Audio)
            .map_err(|e| PipelineError::setup_failed(UnitKind::Audio.name(), e.to_string()))?;
        Ok(Self {
            inputs,
            order,
            toolbox,
            workspace,
            aac_files: Vec::new(),
            output: None,
        })
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn into_workspace(self) -> Workspace {
        self.workspace
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    pub fn pipeline() -> Pipeline<Self> {
        Pipeline::new(UnitKind::Audio.name())
            .with_stage("Transcoded audio files to AAC", Self::transcode)
            .with_stage("Created audio only MKV file", Self::create_audio_only_mkv)
    }

    /// Run both stages and return the audio-only container.
    pub fn build(&mut self, observer: &dyn ProgressObserver) -> PipelineResult<PathBuf> {
        let unit = UnitKind::Audio.name();
        if self.inputs.is_empty() {
            return Err(PipelineError::validation_failed(unit, "no audio files given"));
        }
        if let Some(missing) = self.inputs.iter().find(|f| !f.is_file()) {
            return Err(PipelineError::validation_failed(
                unit,
                format!("Audio file not found: {}", missing.display()),
            ));
        }

        let pipeline = Self::pipeline();
        let elapsed = pipeline
            .run(self)
            .finish_with(|report| observer.stage_finished(UnitKind::Audio, report))?;
        observer.unit_finished(UnitKind::Audio, elapsed);

        self.output.clone().ok_or_else(|| {
            PipelineError::step_failed(
                unit,
                "Created audio only MKV file",
                StepError::other("no audio file was produced"),
            )
        })
    }

    fn transcode(&mut self) -> StepResult<()> {
        self.aac_files.clear();
        for (n, input) in self.inputs.iter().enumerate() {
            let out = self.workspace.join(format!("audio-{:03}.aac", n + 1));
            if is_aac(input) {
                tracing::debug!("Copying {} unchanged", input.display());
                fs::copy(input, &out).map_err(|e| StepError::io_error("copying audio file", e))?;
            } else {
                self.toolbox
                    .run(&ffmpeg::transcode_aac(&self.toolbox.executables, input, &out))?;
            }
            self.aac_files.push(out);
        }

        if self.order == AudioOrder::GeneratedName {
            self.aac_files.sort();
        }
        Ok(())
    }

    fn create_audio_only_mkv(&mut self) -> StepResult<()> {
        let out = self.workspace.join("audio_only.mkv");
        let invocation = OptionFileBuilder::new(&out)
            .aac_is_sbr()
            .segments(self.aac_files.iter().cloned())
            .write(&self.toolbox.executables, &self.workspace.join("audio_only.txt"))?;
        self.toolbox.run(&invocation)?;
        self.output = Some(out);
        Ok(())
    }
}

fn is_aac(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| AAC_EXTENSIONS.iter().any(|a| e.eq_ignore_ascii_case(a)))
}
