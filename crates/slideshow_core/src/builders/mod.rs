//! The two builders and the muxer.
//!
//! Each unit owns one [`Workspace`](crate::workspace::Workspace) and drives
//! external tools through a shared [`Toolbox`].

mod audio;
mod muxer;
mod video;

use std::sync::Arc;

use crate::pipeline::StepResult;
use crate::tools::{Executables, Invocation, ToolOutput, ToolRunner};

pub use audio::{AudioBuilder, AAC_EXTENSIONS};
pub use muxer::{copy_video, doublings_needed, MuxReport, Muxer};
pub use video::{closing_text, sample_indices, VideoBuilder, VideoOptions, MIN_PICTURES};

/// Executable paths plus the runner that invokes them.
#[derive(Clone)]
pub struct Toolbox {
    pub executables: Executables,
    pub runner: Arc<dyn ToolRunner>,
}

impl Toolbox {
    pub fn new(executables: Executables, runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            executables,
            runner,
        }
    }

    /// Run an invocation, failing on an unsuccessful exit.
    pub fn run(&self, invocation: &Invocation) -> StepResult<ToolOutput> {
        self.runner.run(invocation)
    }
}
