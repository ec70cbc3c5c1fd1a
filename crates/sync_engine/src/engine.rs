//! Frame-timeline synchronizer.

use contracts::{
    BoundaryPolicy, FeatureLayout, FeatureTable, FrameTimestamp, GeneralConfig, ResampledSeries,
    SessionId, SyncMethod, SyncedFeatureRow,
};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::lookup::{nearest_index, placement, sample_linear, sample_nearest, Placement};

/// Inputs that cannot be aligned.
#[derive(Debug, Error, PartialEq)]
pub enum SyncError {
    #[error("layout references {expected} devices, {found} series supplied")]
    DeviceCountMismatch { expected: usize, found: usize },

    #[error("series for device '{device}' is empty")]
    EmptySeries { device: String },

    #[error("series for device '{device}' has {found} channels, layout needs {expected}")]
    ChannelMismatch {
        device: String,
        expected: usize,
        found: usize,
    },

    #[error("series for device '{device}' is at {found} Hz, expected {expected} Hz")]
    RateMismatch {
        device: String,
        expected: f64,
        found: f64,
    },
}

/// Synchronizer settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncEngineConfig {
    pub rate_hz: f64,
    pub method: SyncMethod,
    pub boundary: BoundaryPolicy,
}

impl From<&GeneralConfig> for SyncEngineConfig {
    fn from(general: &GeneralConfig) -> Self {
        Self {
            rate_hz: general.sample_rate_hz,
            method: general.sync_method,
            boundary: general.boundary_policy,
        }
    }
}

impl Default for SyncEngineConfig {
    fn default() -> Self {
        Self::from(&GeneralConfig::default())
    }
}

/// Aligns per-device series to video frames in a fixed feature layout.
#[derive(Debug, Clone)]
pub struct SyncEngine {
    config: SyncEngineConfig,
    layout: FeatureLayout,
}

impl SyncEngine {
    pub fn new(layout: FeatureLayout, config: SyncEngineConfig) -> Self {
        Self { config, layout }
    }

    pub fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    pub fn config(&self) -> &SyncEngineConfig {
        &self.config
    }

    /// Build one feature row per frame.
    ///
    /// `series` is indexed like the configured device list. Every frame
    /// yields exactly one row of `layout.dimension()` values.
    #[instrument(
        level = "debug",
        name = "sync_engine_synchronize",
        skip(self, series, frames),
        fields(session = %session, frames = frames.len())
    )]
    pub fn synchronize(
        &self,
        session: &SessionId,
        series: &[ResampledSeries],
        frames: &[FrameTimestamp],
    ) -> Result<FeatureTable, SyncError> {
        self.check_inputs(series)?;

        let mut out_of_span = vec![0usize; series.len()];
        let mut rows = Vec::with_capacity(frames.len());

        for frame in frames {
            let per_device: Vec<Vec<f64>> = series
                .iter()
                .enumerate()
                .map(|(d, s)| {
                    if placement(s, frame.timestamp) != Placement::Inside {
                        out_of_span[d] += 1;
                    }
                    self.sample(s, frame.timestamp)
                })
                .collect();

            rows.push(SyncedFeatureRow {
                frame_index: frame.frame_index,
                timestamp: frame.timestamp,
                features: self.layout.assemble(&per_device),
            });
        }

        self.record_metrics(series, frames, &out_of_span);

        debug!(rows = rows.len(), dimension = self.layout.dimension(), "frames synchronized");

        Ok(FeatureTable {
            session_id: session.clone(),
            rate_hz: self.config.rate_hz,
            labels: self.layout.labels(),
            rows,
        })
    }

    fn sample(&self, series: &ResampledSeries, t: f64) -> Vec<f64> {
        match self.config.method {
            SyncMethod::Nearest => sample_nearest(series, t, self.config.boundary),
            SyncMethod::Linear => sample_linear(series, t, self.config.boundary),
        }
    }

    fn check_inputs(&self, series: &[ResampledSeries]) -> Result<(), SyncError> {
        let expected = self
            .layout
            .slots()
            .iter()
            .map(|s| s.device_index + 1)
            .max()
            .unwrap_or(0);
        if series.len() != expected {
            return Err(SyncError::DeviceCountMismatch {
                expected,
                found: series.len(),
            });
        }

        for s in series {
            if s.is_empty() {
                return Err(SyncError::EmptySeries {
                    device: s.device_id.to_string(),
                });
            }
            if (s.rate_hz - self.config.rate_hz).abs() > 1e-9 {
                return Err(SyncError::RateMismatch {
                    device: s.device_id.to_string(),
                    expected: self.config.rate_hz,
                    found: s.rate_hz,
                });
            }
            if let Some(bad) = s.samples.iter().find(|v| v.len() != s.channels.len()) {
                return Err(SyncError::ChannelMismatch {
                    device: s.device_id.to_string(),
                    expected: s.channels.len(),
                    found: bad.len(),
                });
            }
        }

        for slot in self.layout.slots() {
            let s = &series[slot.device_index];
            if slot.channel_index >= s.channels.len() {
                return Err(SyncError::ChannelMismatch {
                    device: s.device_id.to_string(),
                    expected: slot.channel_index + 1,
                    found: s.channels.len(),
                });
            }
        }
        Ok(())
    }

    fn record_metrics(
        &self,
        series: &[ResampledSeries],
        frames: &[FrameTimestamp],
        out_of_span: &[usize],
    ) {
        metrics::counter!("egosync_frames_synchronized_total").increment(frames.len() as u64);

        for (s, &count) in series.iter().zip(out_of_span) {
            if count > 0 {
                warn!(
                    device = %s.device_id,
                    frames = count,
                    policy = ?self.config.boundary,
                    "frames outside device span"
                );
                metrics::counter!(
                    "egosync_frames_out_of_span_total",
                    "device_id" => s.device_id.to_string()
                )
                .increment(count as u64);
            }

            if self.config.method == SyncMethod::Nearest {
                for frame in frames {
                    let k = nearest_index(s, frame.timestamp);
                    metrics::histogram!(
                        "egosync_sync_alignment_error_ms",
                        "device_id" => s.device_id.to_string()
                    )
                    .record((s.timestamp(k) - frame.timestamp).abs() * 1000.0);
                }
            }
        }
    }
}
