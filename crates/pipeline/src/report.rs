//! Batch report.

use std::path::PathBuf;
use std::time::Duration;

use contracts::{ContractError, SessionId};
use observability::BatchMetricsAggregator;
use serde::Serialize;

use crate::Stage;

/// A session that completed every requested stage
#[derive(Debug, Clone, Serialize)]
pub struct SessionSuccess {
    pub session: SessionId,
    pub rows_resampled: usize,
    pub frames_synced: usize,
    pub files: Vec<PathBuf>,
    #[serde(skip)]
    pub elapsed: Duration,
}

/// A session that stopped at `stage`
#[derive(Debug)]
pub struct SessionFailure {
    pub session: SessionId,
    pub stage: Stage,
    pub error: ContractError,
    pub elapsed: Duration,
}

impl std::fmt::Display for SessionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "session '{}' failed during {}: {}",
            self.session, self.stage, self.error
        )
    }
}

#[derive(Serialize)]
struct FailureView<'a> {
    session: &'a SessionId,
    stage: Stage,
    kind: &'static str,
    error: String,
}

/// Outcome of one batch, sessions in id order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<SessionSuccess>,
    pub failed: Vec<SessionFailure>,
    pub duration: Duration,
    pub metrics: BatchMetricsAggregator,
}

impl BatchReport {
    pub(crate) fn push_success(&mut self, stage_label: &str, success: SessionSuccess) {
        self.metrics
            .observe_stage(stage_label, success.elapsed.as_secs_f64() * 1000.0);
        self.metrics.session_succeeded(
            success.rows_resampled,
            success.frames_synced,
            success.files.len(),
        );
        self.succeeded.push(success);
    }

    pub(crate) fn push_failure(&mut self, stage_label: &str, failure: SessionFailure) {
        self.metrics
            .observe_stage(stage_label, failure.elapsed.as_secs_f64() * 1000.0);
        self.metrics.session_failed(&failure.error);
        self.failed.push(failure);
    }

    /// True when no session failed
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Machine-readable form for `--json`
    pub fn to_json(&self) -> serde_json::Value {
        let failed: Vec<FailureView<'_>> = self
            .failed
            .iter()
            .map(|f| FailureView {
                session: &f.session,
                stage: f.stage,
                kind: f.error.kind(),
                error: f.error.to_string(),
            })
            .collect();
        serde_json::json!({
            "success": self.is_success(),
            "duration_s": self.duration.as_secs_f64(),
            "succeeded": self.succeeded,
            "failed": failed,
        })
    }

    /// Print human-readable summary to stdout
    pub fn print_summary(&self) {
        println!();
        println!("=== egosync batch ===");
        println!(
            "Sessions: {} total, {} ok, {} failed ({:.2}s)",
            self.total(),
            self.succeeded.len(),
            self.failed.len(),
            self.duration.as_secs_f64()
        );

        for success in &self.succeeded {
            println!(
                "  ok    {}  rows={} frames={} files={}",
                success.session,
                success.rows_resampled,
                success.frames_synced,
                success.files.len()
            );
        }
        for failure in &self.failed {
            println!("  FAIL  {failure}");
        }

        println!();
        print!("{}", self.metrics.summary());
    }
}
