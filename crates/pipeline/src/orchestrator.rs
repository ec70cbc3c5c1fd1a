//! Batch orchestrator - runs sessions on the blocking pool.
//!
//! Sessions are independent: one failing session is recorded and the rest
//! continue. A panicking worker fails only its own session. Results are
//! reported in session id order whatever the completion order.

use std::sync::Arc;
use std::time::{Duration, Instant};

use config_loader::SessionEntry;
use contracts::{ContractError, SessionId};
use dispatcher::{create_sink, SinkKind, SinkMetrics};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinError;
use tracing::{error, info, instrument, warn};

use crate::error::PipelineError;
use crate::report::{BatchReport, SessionFailure, SessionSuccess};
use crate::stages::{resample_session, synchronize_session, synchronize_with, Stage};
use crate::{CancelFlag, PipelineContext};

/// Which stages each session runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchMode {
    Resample,
    Synchronize,
    /// Resample then synchronize
    Run,
}

impl BatchMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resample => "resample",
            Self::Synchronize => "synchronize",
            Self::Run => "run",
        }
    }
}

/// Batch options
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub mode: BatchMode,
    /// Sessions processed concurrently (at least 1)
    pub jobs: usize,
    pub sink: SinkKind,
    /// Sessions to process, empty for all
    pub sessions: Vec<SessionId>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            mode: BatchMode::Run,
            jobs: 1,
            sink: SinkKind::Csv,
            sessions: Vec::new(),
        }
    }
}

/// Main batch orchestrator
pub struct Orchestrator {
    context: Arc<PipelineContext>,
    config: OrchestratorConfig,
    sink_metrics: Arc<SinkMetrics>,
    cancel: CancelFlag,
}

impl Orchestrator {
    pub fn new(context: PipelineContext, config: OrchestratorConfig) -> Self {
        Self {
            context: Arc::new(context),
            config,
            sink_metrics: Arc::new(SinkMetrics::new()),
            cancel: CancelFlag::new(),
        }
    }

    /// Flag that stops the batch: queued sessions are skipped and running
    /// ones stop before their next commit
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn sink_metrics(&self) -> &Arc<SinkMetrics> {
        &self.sink_metrics
    }

    /// Run the batch to completion
    ///
    /// # Errors
    /// Only batch-level problems (unknown session id); session errors,
    /// worker panics included, land in the report.
    #[instrument(
        name = "orchestrator_run",
        skip(self),
        fields(mode = self.config.mode.as_str(), jobs = self.config.jobs)
    )]
    pub async fn run(&self) -> Result<BatchReport, PipelineError> {
        let started = Instant::now();
        let entries = self.context.manifest.select(&self.config.sessions)?;
        if entries.is_empty() {
            warn!("no sessions configured");
        }
        info!(sessions = entries.len(), sink = ?self.config.sink, "batch started");

        let context = Arc::clone(&self.context);
        let sink_metrics = Arc::clone(&self.sink_metrics);
        let cancel = self.cancel.clone();
        let (mode, sink) = (self.config.mode, self.config.sink);
        let outcomes = run_sessions(entries, self.config.jobs, move |entry| {
            process_session(&context, entry, mode, sink, &sink_metrics, &cancel)
        })
        .await;

        let mut report = BatchReport::default();
        let label = self.config.mode.as_str();
        for outcome in outcomes {
            match outcome {
                Ok(success) => report.push_success(label, success),
                Err(failure) => report.push_failure(label, failure),
            }
        }
        report.duration = started.elapsed();

        info!(
            ok = report.succeeded.len(),
            failed = report.failed.len(),
            duration_s = report.duration.as_secs_f64(),
            "batch finished"
        );
        Ok(report)
    }
}

type SessionOutcome = Result<SessionSuccess, SessionFailure>;

fn outcome_session(outcome: &SessionOutcome) -> &SessionId {
    match outcome {
        Ok(s) => &s.session,
        Err(f) => &f.session,
    }
}

/// Run `worker` for every entry on the blocking pool, at most `jobs` at a
/// time. Outcomes come back in session id order.
async fn run_sessions<W>(entries: Vec<SessionEntry>, jobs: usize, worker: W) -> Vec<SessionOutcome>
where
    W: Fn(&SessionEntry) -> SessionOutcome + Send + Sync + 'static,
{
    let worker = Arc::new(worker);
    let permits = Arc::new(Semaphore::new(jobs.max(1)));
    let mut handles = Vec::with_capacity(entries.len());

    for entry in entries {
        let permits = Arc::clone(&permits);
        let worker = Arc::clone(&worker);
        let session = entry.id.clone();

        let handle = tokio::spawn(async move {
            // Semaphore is never closed
            let _permit = permits.acquire_owned().await.ok();
            tokio::task::spawn_blocking(move || worker(&entry)).await
        });
        handles.push((session, handle));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for (session, handle) in handles {
        let outcome = match handle.await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join)) | Err(join) => Err(worker_failure(session, join)),
        };
        outcomes.push(outcome);
    }
    outcomes.sort_by(|a, b| outcome_session(a).cmp(outcome_session(b)));
    outcomes
}

/// A worker that did not return becomes a failure of its own session
fn worker_failure(session: SessionId, join: JoinError) -> SessionFailure {
    let message = match join.try_into_panic() {
        Ok(payload) => payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string()),
        Err(join) => join.to_string(),
    };
    let error = ContractError::WorkerPanicked {
        session: session.clone(),
        message,
    };

    observability::record_session_outcome(Stage::Worker.as_str(), Some(&error));
    error!(session = %session, error = %error, "session worker failed");
    SessionFailure {
        session,
        stage: Stage::Worker,
        error,
        elapsed: Duration::ZERO,
    }
}

/// Run the requested stages of one session (blocking)
fn process_session(
    context: &PipelineContext,
    entry: &SessionEntry,
    mode: BatchMode,
    sink_kind: SinkKind,
    sink_metrics: &Arc<SinkMetrics>,
    cancel: &CancelFlag,
) -> SessionOutcome {
    let started = Instant::now();
    let paths = &context.blueprint.paths;
    let fail = |stage: Stage, error: ContractError| {
        observability::record_session_outcome(stage.as_str(), Some(&error));
        error!(
            session = %entry.id,
            stage = %stage,
            kind = error.kind(),
            error = %error,
            "session failed"
        );
        SessionFailure {
            session: entry.id.clone(),
            stage,
            error,
            elapsed: started.elapsed(),
        }
    };
    let timed = |stage: Stage, since: Instant| {
        let millis = since.elapsed().as_secs_f64() * 1000.0;
        observability::record_stage_duration_ms(stage.as_str(), millis);
        observability::record_session_outcome(stage.as_str(), None);
    };

    let mut success = SessionSuccess {
        session: entry.id.clone(),
        rows_resampled: 0,
        frames_synced: 0,
        files: Vec::new(),
        elapsed: Default::default(),
    };

    let first_stage = match mode {
        BatchMode::Synchronize => Stage::Synchronize,
        BatchMode::Resample | BatchMode::Run => Stage::Resample,
    };
    // Queued sessions are skipped once cancelled
    cancel
        .check(&entry.id)
        .map_err(|e| fail(first_stage, e))?;

    let mut in_memory = None;
    if matches!(mode, BatchMode::Resample | BatchMode::Run) {
        let t = Instant::now();
        let mut sink = create_sink(sink_kind, "resample", paths, sink_metrics);
        let output = resample_session(context, entry, sink.as_mut(), cancel)
            .map_err(|e| fail(Stage::Resample, e))?;
        timed(Stage::Resample, t);

        success.rows_resampled = output.rows();
        success.files.extend(output.files);
        // Dry runs write nothing, so synchronize must use the computed series
        if sink_kind == SinkKind::Log {
            in_memory = Some(output.series);
        }
    }

    if matches!(mode, BatchMode::Synchronize | BatchMode::Run) {
        let t = Instant::now();
        let mut sink = create_sink(sink_kind, "features", paths, sink_metrics);
        let output = match &in_memory {
            Some(series) => synchronize_with(context, entry, series, sink.as_mut(), cancel),
            None => synchronize_session(context, entry, sink.as_mut(), cancel),
        }
        .map_err(|e| fail(Stage::Synchronize, e))?;
        timed(Stage::Synchronize, t);

        success.frames_synced = output.table.rows.len();
        success.files.extend(output.files);
    }

    success.elapsed = started.elapsed();
    Ok(success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn entry(id: &str) -> SessionEntry {
        SessionEntry {
            id: id.into(),
            frames_path: PathBuf::from(format!("frames/{id}.frames")),
            frames_header_lines: 0,
            anchor: None,
            inputs: Vec::new(),
        }
    }

    fn succeed(entry: &SessionEntry) -> SessionOutcome {
        Ok(SessionSuccess {
            session: entry.id.clone(),
            rows_resampled: 300,
            frames_synced: 300,
            files: Vec::new(),
            elapsed: Duration::ZERO,
        })
    }

    #[tokio::test]
    async fn test_panicking_worker_fails_only_its_session() {
        let entries = vec![entry("S03"), entry("S02"), entry("S01")];
        let outcomes = run_sessions(entries, 2, |entry| {
            if entry.id == "S02" {
                panic!("grid length overflow");
            }
            succeed(entry)
        })
        .await;

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_ok());
        assert!(outcomes[2].is_ok());

        let failure = outcomes[1].as_ref().unwrap_err();
        assert_eq!(failure.session, "S02");
        assert_eq!(failure.stage, Stage::Worker);
        assert_eq!(failure.error.kind(), "worker_panicked");
        assert!(
            failure.error.to_string().contains("grid length overflow"),
            "got: {}",
            failure.error
        );
    }

    #[tokio::test]
    async fn test_outcomes_in_session_order() {
        let entries = vec![entry("S09"), entry("S01"), entry("S05")];
        let outcomes = run_sessions(entries, 3, succeed).await;
        let order: Vec<&str> = outcomes
            .iter()
            .map(|o| outcome_session(o).as_str())
            .collect();
        assert_eq!(order, ["S01", "S05", "S09"]);
    }
}
