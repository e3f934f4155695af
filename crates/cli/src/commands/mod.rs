//! Command implementations.

mod preview;
mod run;
mod verify;

pub use preview::{run_preview, sample_record, SignedPreview};
pub use run::run_pipeline;
pub use verify::run_verify;
