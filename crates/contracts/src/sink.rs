//! DataSink trait - Dispatcher output interface
//!
//! Defines the abstract interface for Sinks.

use std::path::PathBuf;

use crate::{ContractError, FeatureTable, ResampledSeries};

/// Staged output trait
///
/// Writes are staged until [`DataSink::commit`]; a sink dropped without
/// committing must leave no output behind.
pub trait DataSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Stage one resampled series
    fn write_series(&mut self, series: &ResampledSeries) -> Result<(), ContractError>;

    /// Stage one feature table
    fn write_features(&mut self, table: &FeatureTable) -> Result<(), ContractError>;

    /// Publish everything staged so far
    ///
    /// # Errors
    /// Returns write error; nothing from this commit remains published
    fn commit(&mut self) -> Result<Vec<PathBuf>, ContractError>;
}
