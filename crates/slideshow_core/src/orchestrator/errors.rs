//! Errors of a whole slideshow run.

use std::io;

use thiserror::Error;

use crate::models::{UnitKind, UnknownProfile};
use crate::pipeline::{PipelineError, StepError};
use crate::sources::SourceError;

/// Why a slideshow run failed.
#[derive(Error, Debug)]
pub enum SlideshowError {
    /// The video or audio pipeline failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Combining video and audio failed.
    #[error("Muxer failed: {0}")]
    Mux(#[source] StepError),

    /// A builder thread ended without handing over its result.
    #[error("{0} stopped without reporting a result")]
    WorkerLost(UnitKind),

    #[error(transparent)]
    UnknownProfile(#[from] UnknownProfile),

    /// Input entries could not be resolved.
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("{operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl SlideshowError {
    pub fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }
}
