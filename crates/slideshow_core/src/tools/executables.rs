//! Logical tool names and the paths they resolve to.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// External programs the builders drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Convert,
    Montage,
    Mogrify,
    Ffmpeg,
    Mkvmerge,
}

impl Tool {
    pub const ALL: [Tool; 5] = [
        Tool::Convert,
        Tool::Montage,
        Tool::Mogrify,
        Tool::Ffmpeg,
        Tool::Mkvmerge,
    ];

    /// Logical name, as used in buildfiles and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Convert => "convert",
            Tool::Montage => "montage",
            Tool::Mogrify => "mogrify",
            Tool::Ffmpeg => "ffmpeg",
            Tool::Mkvmerge => "mkvmerge",
        }
    }

    /// Executable name looked up on `PATH` when nothing else is configured.
    pub fn default_program(&self) -> PathBuf {
        if cfg!(windows) {
            PathBuf::from(format!("{}.exe", self.name()))
        } else {
            PathBuf::from(self.name())
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolved executable paths, built once and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Executables {
    convert: PathBuf,
    montage: PathBuf,
    mogrify: PathBuf,
    ffmpeg: PathBuf,
    mkvmerge: PathBuf,
}

impl Default for Executables {
    fn default() -> Self {
        Self {
            convert: Tool::Convert.default_program(),
            montage: Tool::Montage.default_program(),
            mogrify: Tool::Mogrify.default_program(),
            ffmpeg: Tool::Ffmpeg.default_program(),
            mkvmerge: Tool::Mkvmerge.default_program(),
        }
    }
}

impl Executables {
    /// Override the path of one tool.
    pub fn with(mut self, tool: Tool, program: impl Into<PathBuf>) -> Self {
        *self.slot_mut(tool) = program.into();
        self
    }

    /// Override a tool only when a path is given.
    pub fn with_opt(self, tool: Tool, program: Option<impl Into<PathBuf>>) -> Self {
        match program {
            Some(p) => self.with(tool, p),
            None => self,
        }
    }

    /// Path to invoke for `tool`.
    pub fn get(&self, tool: Tool) -> &Path {
        match tool {
            Tool::Convert => &self.convert,
            Tool::Montage => &self.montage,
            Tool::Mogrify => &self.mogrify,
            Tool::Ffmpeg => &self.ffmpeg,
            Tool::Mkvmerge => &self.mkvmerge,
        }
    }

    fn slot_mut(&mut self, tool: Tool) -> &mut PathBuf {
        match tool {
            Tool::Convert => &mut self.convert,
            Tool::Montage => &mut self.montage,
            Tool::Mogrify => &mut self.mogrify,
            Tool::Ffmpeg => &mut self.ffmpeg,
            Tool::Mkvmerge => &mut self.mkvmerge,
        }
    }
}
