//! CsvFileSink - stages CSV files next to their targets, renames on commit

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use contracts::{ContractError, DataSink, FeatureTable, PathsConfig, ResampledSeries};
use tempfile::NamedTempFile;
use tracing::{debug, error, instrument, warn};

use crate::metrics::SinkMetrics;

/// A fully written temp file waiting for its rename
struct Staged {
    file: NamedTempFile,
    target: PathBuf,
}

/// Sink that writes series and feature tables as CSV under the configured
/// output directories.
///
/// Each file is written to a temp file in the target directory and renamed
/// into place on commit, so readers never see a partial file.
pub struct CsvFileSink {
    name: String,
    paths: PathsConfig,
    staged: Vec<Staged>,
    metrics: Arc<SinkMetrics>,
}

impl CsvFileSink {
    pub fn new(name: impl Into<String>, paths: PathsConfig) -> Self {
        Self::with_metrics(name, paths, Arc::new(SinkMetrics::new()))
    }

    /// Share counters with other sinks of the same batch
    pub fn with_metrics(
        name: impl Into<String>,
        paths: PathsConfig,
        metrics: Arc<SinkMetrics>,
    ) -> Self {
        Self {
            name: name.into(),
            paths,
            staged: Vec::new(),
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Targets staged but not yet committed
    pub fn pending(&self) -> Vec<&Path> {
        self.staged.iter().map(|s| s.target.as_path()).collect()
    }

    fn stage<F>(&mut self, target: PathBuf, fill: F) -> Result<(), ContractError>
    where
        F: FnOnce(&mut csv::Writer<&mut NamedTempFile>) -> csv::Result<()>,
    {
        let result = stage_file(&target, fill);
        match result {
            Ok(file) => {
                debug!(sink = %self.name, target = %target.display(), "file staged");
                self.metrics.inc_staged();
                self.staged.push(Staged { file, target });
                Ok(())
            }
            Err(e) => {
                error!(sink = %self.name, target = %target.display(), error = %e, "staging failed");
                self.metrics.inc_failure();
                Err(e)
            }
        }
    }

    /// Remove files already renamed into place by a failed commit
    fn roll_back(&self, published: &[PathBuf]) {
        for path in published {
            if let Err(e) = fs::remove_file(path) {
                warn!(sink = %self.name, path = %path.display(), error = %e, "rollback failed");
            }
        }
        self.metrics.add_rollback(published.len() as u64);
    }
}

fn stage_file<F>(target: &Path, fill: F) -> Result<NamedTempFile, ContractError>
where
    F: FnOnce(&mut csv::Writer<&mut NamedTempFile>) -> csv::Result<()>,
{
    let dir = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(dir).map_err(|e| ContractError::io(dir, e))?;

    let mut file = NamedTempFile::new_in(dir).map_err(|e| ContractError::io(dir, e))?;
    {
        let mut writer = csv::Writer::from_writer(&mut file);
        fill(&mut writer).map_err(|e| csv_error(target, e))?;
        writer.flush().map_err(|e| ContractError::io(target, e))?;
    }
    file.as_file_mut()
        .flush()
        .map_err(|e| ContractError::io(target, e))?;
    Ok(file)
}

fn csv_error(target: &Path, err: csv::Error) -> ContractError {
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(e) => ContractError::io(target, e),
        _ => ContractError::io(target, std::io::Error::other(message)),
    }
}

/// Shortest text that parses back to the same `f64`
#[inline]
fn fmt_f64(v: f64) -> String {
    v.to_string()
}

impl DataSink for CsvFileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "csv_sink_write_series",
        skip(self, series),
        fields(sink = %self.name, session = %series.session_id, device = %series.device_id)
    )]
    fn write_series(&mut self, series: &ResampledSeries) -> Result<(), ContractError> {
        let target = self
            .paths
            .resampled_path(&series.session_id, &series.device_id, series.rate_hz);
        self.stage(target, |w| {
            let mut header = Vec::with_capacity(series.channels.len() + 1);
            header.push("timestamp");
            header.extend(series.channels.iter().map(String::as_str));
            w.write_record(&header)?;

            for (t, values) in series.iter() {
                let mut record = Vec::with_capacity(values.len() + 1);
                record.push(fmt_f64(t));
                record.extend(values.iter().copied().map(fmt_f64));
                w.write_record(&record)?;
            }
            Ok(())
        })
    }

    #[instrument(
        name = "csv_sink_write_features",
        skip(self, table),
        fields(sink = %self.name, session = %table.session_id, rows = table.rows.len())
    )]
    fn write_features(&mut self, table: &FeatureTable) -> Result<(), ContractError> {
        let target = self.paths.features_path(&table.session_id, table.rate_hz);
        self.stage(target, |w| {
            let mut header = Vec::with_capacity(table.labels.len() + 2);
            header.push("frame_index");
            header.push("timestamp");
            header.extend(table.labels.iter().map(String::as_str));
            w.write_record(&header)?;

            for row in &table.rows {
                let mut record = Vec::with_capacity(row.features.len() + 2);
                record.push(row.frame_index.to_string());
                record.push(fmt_f64(row.timestamp));
                record.extend(row.features.iter().copied().map(fmt_f64));
                w.write_record(&record)?;
            }
            Ok(())
        })
    }

    #[instrument(
        name = "csv_sink_commit",
        skip(self),
        fields(sink = %self.name, files = self.staged.len())
    )]
    fn commit(&mut self) -> Result<Vec<PathBuf>, ContractError> {
        let mut published = Vec::with_capacity(self.staged.len());
        // Remaining temp files are deleted on drop if a rename fails
        let staged = std::mem::take(&mut self.staged);

        for Staged { file, target } in staged {
            match file.persist(&target) {
                Ok(_) => published.push(target),
                Err(e) => {
                    error!(
                        sink = %self.name,
                        target = %target.display(),
                        error = %e.error,
                        "commit failed"
                    );
                    self.metrics.inc_failure();
                    self.roll_back(&published);
                    return Err(ContractError::io(target, e.error));
                }
            }
        }

        self.metrics.add_committed(published.len() as u64);
        metrics::counter!("egosync_files_written_total", "sink" => self.name.clone())
            .increment(published.len() as u64);
        debug!(sink = %self.name, files = published.len(), "commit complete");
        Ok(published)
    }
}
