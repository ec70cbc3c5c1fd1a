//! LogSink - dry-run sink that only logs what would be written

use std::path::PathBuf;

use contracts::{ContractError, DataSink, FeatureTable, PathsConfig, ResampledSeries};
use tracing::{info, instrument};

/// Sink that logs output summaries instead of touching the filesystem
pub struct LogSink {
    name: String,
    paths: PathsConfig,
    pending: Vec<PathBuf>,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>, paths: PathsConfig) -> Self {
        Self {
            name: name.into(),
            paths,
            pending: Vec::new(),
        }
    }
}

impl DataSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write_series",
        skip(self, series),
        fields(sink = %self.name)
    )]
    fn write_series(&mut self, series: &ResampledSeries) -> Result<(), ContractError> {
        let target = self
            .paths
            .resampled_path(&series.session_id, &series.device_id, series.rate_hz);
        info!(
            sink = %self.name,
            session = %series.session_id,
            device = %series.device_id,
            rows = series.len(),
            start = series.start,
            target = %target.display(),
            "series ready"
        );
        self.pending.push(target);
        Ok(())
    }

    #[instrument(
        name = "log_sink_write_features",
        skip(self, table),
        fields(sink = %self.name)
    )]
    fn write_features(&mut self, table: &FeatureTable) -> Result<(), ContractError> {
        let target = self.paths.features_path(&table.session_id, table.rate_hz);
        info!(
            sink = %self.name,
            session = %table.session_id,
            rows = table.rows.len(),
            dimension = table.dimension(),
            target = %target.display(),
            "feature table ready"
        );
        self.pending.push(target);
        Ok(())
    }

    /// Nothing is published; the would-be targets are logged and dropped.
    #[instrument(name = "log_sink_commit", skip(self))]
    fn commit(&mut self) -> Result<Vec<PathBuf>, ContractError> {
        for target in self.pending.drain(..) {
            info!(sink = %self.name, target = %target.display(), "dry run, not written");
        }
        Ok(Vec::new())
    }
}
