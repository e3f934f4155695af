//! Pipeline orchestration module.

mod orchestrator;
mod stats;

pub use orchestrator::{Pipeline, PipelineConfig, RunState};
pub use stats::{ExitStatus, PipelineStats};
