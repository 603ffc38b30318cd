//! External tool layer.
//!
//! - [`Executables`]: immutable map from logical tool to program path
//! - [`ToolRunner`]: the seam every builder calls through
//! - discovery helpers for `list-progs` and `list-fonts`

mod discovery;
mod executables;
mod runner;

#[cfg(test)]
pub(crate) mod fake;

pub use discovery::{find_program, list_fonts, list_programs, parse_font_list, DEFAULT_FONT};
pub use executables::{Executables, Tool};
pub use runner::{check_exit, Invocation, ProcessRunner, ToolOutput, ToolRunner};
