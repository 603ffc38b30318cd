//! Locating tools on `PATH` and querying ImageMagick for fonts.

use std::env;
use std::path::{Path, PathBuf};

use crate::pipeline::StepResult;

use super::executables::{Executables, Tool};
use super::runner::{Invocation, ToolRunner};

/// Font used for title and epilog text when none is configured.
#[cfg(windows)]
pub const DEFAULT_FONT: &str = "Cooper-Black";
/// Font used for title and epilog text when none is configured.
#[cfg(not(windows))]
pub const DEFAULT_FONT: &str = "DejaVu-Sans-Book";

/// Resolve `program` the way a shell would.
///
/// Paths with a directory component are checked as given; bare names are
/// searched in every `PATH` entry.
pub fn find_program(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 {
        return program.is_file().then(|| program.to_path_buf());
    }

    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

/// Resolved location of every configured tool.
pub fn list_programs(exes: &Executables) -> Vec<(Tool, Option<PathBuf>)> {
    Tool::ALL
        .iter()
        .map(|&tool| (tool, find_program(exes.get(tool))))
        .collect()
}

/// Fonts known to ImageMagick, in the order it lists them.
pub fn list_fonts(runner: &dyn ToolRunner, exes: &Executables) -> StepResult<Vec<String>> {
    let inv = Invocation::new(exes, Tool::Convert).args(["-list", "font"]);
    let output = runner.run(&inv)?;
    Ok(parse_font_list(&output.stdout))
}

/// Extract font names from `convert -list font` output.
pub fn parse_font_list(listing: &str) -> Vec<String> {
    listing
        .lines()
        .filter_map(|line| line.trim().strip_prefix("Font:"))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}
