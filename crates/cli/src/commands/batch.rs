//! `resample`, `synchronize` and `run` command implementation.

use anyhow::{Context, Result};
use tracing::{info, warn};

use contracts::SessionId;
use pipeline::{BatchMode, Orchestrator, OrchestratorConfig, PipelineContext, SinkKind};

use crate::cli::BatchArgs;

/// Execute one of the batch commands
pub async fn run_batch(mode: BatchMode, args: &BatchArgs) -> Result<()> {
    info!(config = %args.config.display(), mode = mode.as_str(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let context = PipelineContext::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.dry_run {
        info!("Dry run mode - nothing will be written");
    }

    let config = OrchestratorConfig {
        mode,
        jobs: args.jobs.max(1),
        sink: SinkKind::dry_run(args.dry_run),
        sessions: args.sessions.iter().map(|s| SessionId::new(s)).collect(),
    };
    let orchestrator = Orchestrator::new(context, config);
    let cancel = orchestrator.cancel_flag();

    let shutdown_signal = setup_shutdown_signal();

    tokio::select! {
        result = orchestrator.run() => {
            let report = result.context("Batch execution failed")?;

            if args.json {
                let json = serde_json::to_string_pretty(&report.to_json())
                    .context("Failed to serialize batch report")?;
                println!("{}", json);
            } else {
                report.print_summary();
            }

            if !report.is_success() {
                anyhow::bail!(
                    "{} of {} sessions failed",
                    report.failed.len(),
                    report.total()
                );
            }
        }
        _ = shutdown_signal => {
            // Running workers finish their current device, then stop before committing
            cancel.cancel();
            warn!("Received shutdown signal, skipping queued sessions and pending commits");
            anyhow::bail!("Interrupted");
        }
    }

    info!("egosync finished");
    Ok(())
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
