//! Error types for stage pipelines.
//!
//! Errors carry context that chains through layers:
//! Unit → Stage → Operation → Detail

use std::io;
use std::path::Path;

use thiserror::Error;

/// Error from a builder's pipeline, tagged with the unit that ran it.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A stage failed during execution.
    #[error("{unit} failed at stage '{stage}': {source}")]
    StepFailed {
        unit: String,
        stage: String,
        #[source]
        source: StepError,
    },

    /// Input validation failed before any stage ran.
    #[error("{unit} failed validation: {message}")]
    ValidationFailed { unit: String, message: String },

    /// Failed to set up the unit (workspace creation etc.).
    #[error("{unit} setup failed: {message}")]
    SetupFailed { unit: String, message: String },
}

impl PipelineError {
    /// Create a stage failed error.
    pub fn step_failed(unit: impl Into<String>, stage: impl Into<String>, source: StepError) -> Self {
        Self::StepFailed {
            unit: unit.into(),
            stage: stage.into(),
            source,
        }
    }

    /// Create a validation failed error.
    pub fn validation_failed(unit: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            unit: unit.into(),
            message: message.into(),
        }
    }

    /// Create a setup failed error.
    pub fn setup_failed(unit: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SetupFailed {
            unit: unit.into(),
            message: message.into(),
        }
    }

    /// Name of the stage that failed, if a stage was running.
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::StepFailed { stage, .. } => Some(stage),
            _ => None,
        }
    }
}

/// Error from a single stage with operation context.
#[derive(Error, Debug)]
pub enum StepError {
    /// Input validation failed.
    #[error("Input validation failed: {0}")]
    InvalidInput(String),

    /// An external command exited unsuccessfully.
    #[error("{tool} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    /// File I/O error.
    #[error("I/O error in {operation}: {source}")]
    IoError {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// A required file was not found.
    #[error("Required file not found: {path}")]
    FileNotFound { path: String },

    /// Parsing error (durations, tool output).
    #[error("Failed to parse {what}: {message}")]
    ParseError { what: String, message: String },

    /// A precondition was not met.
    #[error("Precondition not met: {0}")]
    PreconditionFailed(String),

    /// Generic stage error with message.
    #[error("{0}")]
    Other(String),
}

impl StepError {
    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a command failed error.
    pub fn command_failed(
        tool: impl Into<String>,
        exit_code: i32,
        message: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            tool: tool.into(),
            exit_code,
            message: message.into(),
        }
    }

    /// Create an I/O error with context.
    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::IoError {
            operation: operation.into(),
            source,
        }
    }

    /// Create a file not found error.
    pub fn file_not_found(path: &Path) -> Self {
        Self::FileNotFound {
            path: path.display().to_string(),
        }
    }

    /// Create a parse error.
    pub fn parse_error(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseError {
            what: what.into(),
            message: message.into(),
        }
    }

    /// Create a precondition failed error.
    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::PreconditionFailed(message.into())
    }

    /// Create a generic error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

/// Result type for stage operations.
pub type StepResult<T> = Result<T, StepError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
