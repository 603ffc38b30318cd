//! Slideshow core - building slideshow videos from still pictures
//!
//! This crate drives ImageMagick, ffmpeg and mkvmerge to turn pictures and
//! optional audio into a Matroska slideshow. It has no CLI dependencies and
//! can be used by any front end.

pub mod builders;
pub mod commands;
pub mod config;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod pipeline;
pub mod sources;
pub mod tools;
pub mod workspace;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
