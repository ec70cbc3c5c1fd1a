//! Per-session stages
//!
//! Each stage computes everything for the session first and only then stages
//! and commits output, so a failure mid-session leaves no partial results.
//! A [`CancelFlag`] is checked between devices and before every commit.

use std::path::PathBuf;

use config_loader::SessionEntry;
use contracts::{ContractError, DataSink, DeviceConfig, FeatureTable, ResampledSeries};
use ingestion::{read_frame_timestamps, read_raw_log, read_resampled_series};
use resampler::{ResampleOptions, Resampler};
use serde::Serialize;
use sync_engine::{SyncEngine, SyncEngineConfig};
use tracing::{debug, info, instrument};

use crate::{CancelFlag, PipelineContext};

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Resample,
    Synchronize,
    /// The session worker itself (panic)
    Worker,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resample => "resample",
            Self::Synchronize => "synchronize",
            Self::Worker => "worker",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of the resample stage
#[derive(Debug, Clone)]
pub struct ResampleOutput {
    /// Series in configured device order
    pub series: Vec<ResampledSeries>,
    pub files: Vec<PathBuf>,
}

impl ResampleOutput {
    pub fn rows(&self) -> usize {
        self.series.iter().map(ResampledSeries::len).sum()
    }
}

/// Result of the synchronize stage
#[derive(Debug, Clone)]
pub struct SynchronizeOutput {
    pub table: FeatureTable,
    pub files: Vec<PathBuf>,
}

fn device_config<'a>(
    ctx: &'a PipelineContext,
    index: usize,
) -> Result<&'a DeviceConfig, ContractError> {
    ctx.blueprint
        .devices
        .get(index)
        .ok_or_else(|| ContractError::config("devices", format!("no device at index {index}")))
}

/// Compute every device series of a session without writing anything.
pub fn compute_series(
    ctx: &PipelineContext,
    entry: &SessionEntry,
    cancel: &CancelFlag,
) -> Result<Vec<ResampledSeries>, ContractError> {
    entry.verify_raw_inputs()?;

    let general = &ctx.blueprint.general;
    let resampler = Resampler::new(ResampleOptions::from_general(general, entry.anchor));

    let mut series = Vec::with_capacity(entry.inputs.len());
    for input in &entry.inputs {
        cancel.check(&entry.id)?;
        let device = device_config(ctx, input.device_index)?;
        let readings = read_raw_log(&input.raw_path, device, general.timestamp_format)?;
        observability::record_raw_readings(device.id.as_str(), readings.len());

        let resampled = resampler
            .resample(readings, &entry.id, device)
            .map_err(|e| e.into_contract(device, &input.raw_path))?;
        observability::record_rows_resampled(device.id.as_str(), resampled.len());

        debug!(
            device = %device.id,
            rows = resampled.len(),
            start = resampled.start,
            "device resampled"
        );
        series.push(resampled);
    }
    Ok(series)
}

/// Resample every device of a session and commit the series.
#[instrument(name = "resample_session", skip_all, fields(session = %entry.id))]
pub fn resample_session(
    ctx: &PipelineContext,
    entry: &SessionEntry,
    sink: &mut dyn DataSink,
    cancel: &CancelFlag,
) -> Result<ResampleOutput, ContractError> {
    let series = compute_series(ctx, entry, cancel)?;
    cancel.check(&entry.id)?;

    for s in &series {
        sink.write_series(s)?;
    }
    let files = sink.commit()?;

    info!(
        devices = series.len(),
        rows = series.iter().map(ResampledSeries::len).sum::<usize>(),
        files = files.len(),
        "session resampled"
    );
    Ok(ResampleOutput { series, files })
}

/// Load a session's resampled series from disk, in configured device order.
pub fn load_series(
    ctx: &PipelineContext,
    entry: &SessionEntry,
) -> Result<Vec<ResampledSeries>, ContractError> {
    let rate_hz = ctx.rate_hz();
    entry
        .inputs
        .iter()
        .map(|input| {
            let device = device_config(ctx, input.device_index)?;
            let path = ctx
                .blueprint
                .paths
                .resampled_path(&entry.id, &device.id, rate_hz);
            read_resampled_series(&path, &entry.id, device, rate_hz)
        })
        .collect()
}

/// Align series to the session's frames without writing anything.
pub fn compute_features(
    ctx: &PipelineContext,
    entry: &SessionEntry,
    series: &[ResampledSeries],
) -> Result<FeatureTable, ContractError> {
    let general = &ctx.blueprint.general;
    let frames = read_frame_timestamps(
        &entry.frames_path,
        entry.frames_header_lines,
        general.timestamp_format,
    )?;

    let engine = SyncEngine::new(ctx.layout.clone(), SyncEngineConfig::from(general));
    engine
        .synchronize(&entry.id, series, &frames)
        .map_err(|e| ContractError::config(format!("sessions[{}]", entry.id), e.to_string()))
}

/// Synchronize a session from its on-disk series and commit the table.
#[instrument(name = "synchronize_session", skip_all, fields(session = %entry.id))]
pub fn synchronize_session(
    ctx: &PipelineContext,
    entry: &SessionEntry,
    sink: &mut dyn DataSink,
    cancel: &CancelFlag,
) -> Result<SynchronizeOutput, ContractError> {
    let series = load_series(ctx, entry)?;
    synchronize_with(ctx, entry, &series, sink, cancel)
}

/// Synchronize a session from series already in memory and commit the table.
pub fn synchronize_with(
    ctx: &PipelineContext,
    entry: &SessionEntry,
    series: &[ResampledSeries],
    sink: &mut dyn DataSink,
    cancel: &CancelFlag,
) -> Result<SynchronizeOutput, ContractError> {
    let table = compute_features(ctx, entry, series)?;
    cancel.check(&entry.id)?;
    sink.write_features(&table)?;
    let files = sink.commit()?;

    info!(
        session = %entry.id,
        frames = table.rows.len(),
        dimension = table.dimension(),
        "session synchronized"
    );
    Ok(SynchronizeOutput { table, files })
}
