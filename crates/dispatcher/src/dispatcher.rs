//! Sink factory

use std::sync::Arc;

use contracts::{DataSink, PathsConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::metrics::SinkMetrics;
use crate::sinks::{CsvFileSink, LogSink};

/// Output sink selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    /// Atomic CSV files under the configured output directories
    #[default]
    Csv,
    /// Log only (dry run)
    Log,
}

impl SinkKind {
    pub fn dry_run(dry_run: bool) -> Self {
        if dry_run {
            Self::Log
        } else {
            Self::Csv
        }
    }
}

/// Create a fresh sink for one session.
///
/// Sinks hold staged files, so each session gets its own; `metrics` is
/// shared so batch totals survive the sink.
pub fn create_sink(
    kind: SinkKind,
    name: &str,
    paths: &PathsConfig,
    metrics: &Arc<SinkMetrics>,
) -> Box<dyn DataSink + Send> {
    debug!(sink = name, kind = ?kind, "creating sink");
    match kind {
        SinkKind::Csv => Box::new(CsvFileSink::with_metrics(
            name,
            paths.clone(),
            Arc::clone(metrics),
        )),
        SinkKind::Log => Box::new(LogSink::new(name, paths.clone())),
    }
}
