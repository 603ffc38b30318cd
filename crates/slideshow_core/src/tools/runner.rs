//! Running external tools.
//!
//! Builders never spawn processes themselves. They describe each call as an
//! [`Invocation`] and hand it to a [`ToolRunner`], which keeps command
//! construction testable without the tools installed.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use crate::logging::RunLogger;
use crate::pipeline::{StepError, StepResult};

use super::executables::{Executables, Tool};

/// One call of an external tool.
///
/// Arguments are kept as `OsString` so paths reach the tool byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub tool: Tool,
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl Invocation {
    /// Start an invocation of `tool` using the configured executable.
    pub fn new(exes: &Executables, tool: Tool) -> Self {
        Self {
            tool,
            program: exes.get(tool).to_path_buf(),
            args: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append a path argument.
    pub fn path(self, path: &Path) -> Self {
        self.arg(path.as_os_str())
    }

    /// Append several arguments.
    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Arguments as text, with invalid UTF-8 replaced.
    pub fn arg_strings(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// Human-readable command line for logs.
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in self.arg_strings() {
            line.push(' ');
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                line.push('"');
                line.push_str(&arg);
                line.push('"');
            } else {
                line.push_str(&arg);
            }
        }
        line
    }
}

/// Captured result of a finished tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Executes invocations, blocking until the process exits.
///
/// Shared between the video and audio threads, hence `Send + Sync`.
pub trait ToolRunner: Send + Sync {
    /// Run and capture output without judging the exit code.
    fn output(&self, invocation: &Invocation) -> StepResult<ToolOutput>;

    /// Run and fail unless the tool reports success.
    fn run(&self, invocation: &Invocation) -> StepResult<ToolOutput> {
        let output = self.output(invocation)?;
        check_exit(invocation, output)
    }
}

/// Map any non-zero exit into [`StepError::CommandFailed`].
pub fn check_exit(invocation: &Invocation, output: ToolOutput) -> StepResult<ToolOutput> {
    if output.exit_code == 0 {
        return Ok(output);
    }

    let message = if output.stderr.trim().is_empty() {
        output.stdout.trim().to_string()
    } else {
        output.stderr.trim().to_string()
    };
    Err(StepError::command_failed(
        invocation.tool.name(),
        output.exit_code,
        message,
    ))
}

/// Runs tools as child processes via `std::process::Command`.
pub struct ProcessRunner {
    logger: Arc<RunLogger>,
}

impl ProcessRunner {
    pub fn new(logger: Arc<RunLogger>) -> Self {
        Self { logger }
    }

    /// Dump the tokens of an `mkvmerge @file` option file to the log.
    fn log_option_file(&self, invocation: &Invocation) {
        if invocation.tool != Tool::Mkvmerge {
            return;
        }
        let Some(file) = invocation
            .args
            .first()
            .and_then(|a| a.to_str())
            .and_then(|a| a.strip_prefix('@'))
        else {
            return;
        };
        match std::fs::read_to_string(file) {
            Ok(content) => {
                let tokens: Vec<String> = content.lines().map(str::to_string).collect();
                self.logger.log_options_json(&tokens);
            }
            Err(e) => tracing::warn!("Could not read option file {}: {}", file, e),
        }
    }
}

impl ToolRunner for ProcessRunner {
    fn output(&self, invocation: &Invocation) -> StepResult<ToolOutput> {
        let line = invocation.command_line();
        self.logger.command(&line);
        tracing::debug!("Running: {}", line);
        self.log_option_file(invocation);

        let result = Command::new(&invocation.program)
            .args(&invocation.args)
            .output()
            .map_err(|e| StepError::io_error(format!("executing {}", invocation.tool), e))?;

        let output = ToolOutput {
            exit_code: result.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&result.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
        };

        for line in output.stdout.lines() {
            self.logger.output_line(line, false);
        }
        for line in output.stderr.lines() {
            self.logger.output_line(line, true);
        }

        Ok(output)
    }

    fn run(&self, invocation: &Invocation) -> StepResult<ToolOutput> {
        let output = self.output(invocation)?;
        check_exit(invocation, output).inspect_err(|_| {
            self.logger
                .show_tail(&format!("{} output", invocation.tool));
        })
    }
}
