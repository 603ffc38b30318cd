//! Argument builders for every external tool call.
//!
//! These functions are pure: they only assemble [`Invocation`]s (and write
//! mkvmerge option files). Running them is up to a
//! [`ToolRunner`](crate::tools::ToolRunner).
//!
//! [`Invocation`]: crate::tools::Invocation

pub mod ffmpeg;
pub mod imagemagick;
pub mod mkvmerge;

pub use imagemagick::TextStyle;
pub use mkvmerge::OptionFileBuilder;
