//! # Pipeline
//!
//! Session stages and the batch orchestrator.
//!
//! - `resample`: raw logs → one uniform series per device
//! - `synchronize`: series + frame timestamps → one feature table
//! - `run`: both, per session
//!
//! ## Usage Example
//!
//! ```ignore
//! use pipeline::{BatchMode, Orchestrator, OrchestratorConfig, PipelineContext};
//!
//! let context = PipelineContext::load(Path::new("config.toml"))?;
//! let report = Orchestrator::new(context, OrchestratorConfig {
//!     mode: BatchMode::Run,
//!     jobs: 4,
//!     ..Default::default()
//! })
//! .run()
//! .await?;
//! report.print_summary();
//! ```

mod cancel;
mod context;
mod error;
mod orchestrator;
mod report;
mod stages;

pub use cancel::CancelFlag;
pub use context::PipelineContext;
pub use error::PipelineError;
pub use orchestrator::{BatchMode, Orchestrator, OrchestratorConfig};
pub use report::{BatchReport, SessionFailure, SessionSuccess};
pub use stages::{
    compute_features, compute_series, load_series, resample_session, synchronize_session,
    synchronize_with, ResampleOutput, Stage, SynchronizeOutput,
};

// Re-exports
pub use dispatcher::SinkKind;
