//! ResampledSeries - Resampler output, Synchronizer input

use serde::{Deserialize, Serialize};

use crate::{DeviceId, SessionId};

/// Uniformly sampled series for one (session, device) pair.
///
/// Timestamps are positional: sample `k` lives at `start + k / rate_hz`,
/// so spacing is constant by construction and there are no gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResampledSeries {
    pub session_id: SessionId,
    pub device_id: DeviceId,

    /// Timestamp of sample 0 (seconds)
    pub start: f64,

    /// Sample rate (Hz)
    pub rate_hz: f64,

    /// Channel names, in value order
    pub channels: Vec<String>,

    /// One value vector per sample
    pub samples: Vec<Vec<f64>>,
}

impl ResampledSeries {
    /// Timestamp of sample `k`
    ///
    /// Computed as `start + k / rate` rather than accumulated, so spacing
    /// error does not grow with `k`.
    #[inline]
    pub fn timestamp(&self, k: usize) -> f64 {
        self.start + k as f64 / self.rate_hz
    }

    /// Number of samples
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Timestamp of the last sample
    pub fn end(&self) -> Option<f64> {
        self.len().checked_sub(1).map(|k| self.timestamp(k))
    }

    /// Iterate `(timestamp, values)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (f64, &[f64])> + '_ {
        self.samples
            .iter()
            .enumerate()
            .map(|(k, values)| (self.timestamp(k), values.as_slice()))
    }
}
