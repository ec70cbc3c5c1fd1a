//! Batch-level error types.

use thiserror::Error;

/// Errors that stop a whole batch (session errors are reported, not raised)
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration or session selection problem
    #[error(transparent)]
    Contract(#[from] contracts::ContractError),
}
