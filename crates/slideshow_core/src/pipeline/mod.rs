//! Stage pipelines for the builders.
//!
//! Each builder owns a fixed, ordered list of stages. Running the pipeline
//! executes the stages one after another on the calling thread and yields
//! a report per stage as it completes.
//!
//! # Architecture
//!
//! ```text
//! Pipeline<VideoBuilder>
//!     ├── Stage: Copied source files to workdir
//!     ├── Stage: Created first picture with fade-in
//!     ├── ...
//!     └── Stage: Created video only MKV file
//! ```
//!
//! # Example
//!
//! ```ignore
//! let pipeline = Pipeline::new("VideoBuilder")
//!     .with_stage("Copied source files to workdir", VideoBuilder::copy_source_files)
//!     .with_stage("Resized pictures according to profile", VideoBuilder::resize_pictures);
//!
//! for report in pipeline.run(&mut builder) {
//!     println!("{}", report?);
//! }
//! ```

mod errors;
mod observer;
mod runner;
mod stage;

pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use observer::{LoggingObserver, NoopObserver, ProgressObserver};
pub use runner::{Pipeline, PipelineRun};
pub use stage::{Stage, StageFn, StageReport};
