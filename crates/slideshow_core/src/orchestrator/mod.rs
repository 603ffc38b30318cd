//! Orchestration of a complete slideshow run.
//!
//! # Architecture
//!
//! ```text
//! Orchestrator
//!     ├── thread: VideoBuilder ──┐
//!     ├── thread: AudioBuilder ──┤ (workspace, result) over sync_channel(1)
//!     └── Muxer  <───────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! use slideshow_core::logging::RunLogger;
//! use slideshow_core::orchestrator::{Orchestrator, SlideshowOptions};
//! use slideshow_core::tools::ProcessRunner;
//!
//! let runner = Arc::new(ProcessRunner::new(Arc::new(RunLogger::disabled())));
//! let images: Vec<PathBuf> = (1..=4).map(|i| format!("img{i}.jpg").into()).collect();
//! let report = Orchestrator::new(runner)
//!     .run(images, Vec::new(), &SlideshowOptions::default())
//!     .unwrap();
//! println!("Wrote {}", report.output.display());
//! ```

mod errors;
mod options;
mod slideshow;

pub use errors::SlideshowError;
pub use options::{normalize_output, SlideshowOptions};
pub use slideshow::{slideshow, Orchestrator, SlideshowReport, PROGRESS_INTERVAL};
