//! # Resampler
//!
//! Converts irregularly timestamped sensor readings into a uniform series.
//!
//! Steps, in order:
//! - stable sort by timestamp, collapse duplicates per [`DuplicatePolicy`]
//! - lay out the grid `start + k / rate` over the readings' span
//! - linearly interpolate each grid point, clamped to the bracketing pair
//!
//! ## Usage Example
//!
//! ```ignore
//! use resampler::{Resampler, ResampleOptions};
//!
//! let resampler = Resampler::new(ResampleOptions::from_general(&blueprint.general, anchor));
//! let series = resampler.resample(readings, &session_id, &device)?;
//! ```

mod grid;
pub mod interp;
mod prepare;

use std::path::Path;

use contracts::{
    BoundaryPolicy, ContractError, DeviceConfig, DuplicatePolicy, GeneralConfig, ResampledSeries,
    SensorReading, SessionId,
};
use thiserror::Error;
use tracing::{debug, instrument, warn};

pub use grid::Grid;
pub use prepare::{prepare, Prepared};

/// Resampling failures not tied to a file.
#[derive(Debug, Error, PartialEq)]
pub enum ResampleError {
    #[error("no readings to resample")]
    Empty,

    #[error("reading {index} has {found} values, device declares {expected} channels")]
    ChannelMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("reading {index} has non-finite timestamp")]
    NonFiniteTimestamp { index: usize },

    #[error("readings span {first} s to {last} s, more than the {max_span_s} s limit")]
    SpanTooLarge {
        first: f64,
        last: f64,
        max_span_s: f64,
    },
}

impl ResampleError {
    /// Attach the source file of the readings.
    pub fn into_contract(self, device: &DeviceConfig, source: &Path) -> ContractError {
        match self {
            Self::Empty => ContractError::empty_input(device.id.to_string(), source),
            other => ContractError::parse(source, 0, other.to_string()),
        }
    }
}

/// Resampling parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResampleOptions {
    pub rate_hz: f64,
    /// Lattice anchor (seconds), usually the video head
    pub anchor: Option<f64>,
    pub boundary: BoundaryPolicy,
    pub duplicates: DuplicatePolicy,
    /// Longest accepted `last - first` (seconds)
    pub max_span_s: f64,
}

impl ResampleOptions {
    pub fn from_general(general: &GeneralConfig, anchor: Option<f64>) -> Self {
        Self {
            rate_hz: general.sample_rate_hz,
            anchor,
            boundary: general.boundary_policy,
            duplicates: general.duplicate_policy,
            max_span_s: general.max_span_s,
        }
    }
}

impl Default for ResampleOptions {
    fn default() -> Self {
        Self::from_general(&GeneralConfig::default(), None)
    }
}

/// Uniform-rate resampler
#[derive(Debug, Clone)]
pub struct Resampler {
    options: ResampleOptions,
}

impl Resampler {
    pub fn new(options: ResampleOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ResampleOptions {
        &self.options
    }

    /// Resample one device's readings.
    #[instrument(
        level = "debug",
        name = "resample",
        skip(self, readings, device),
        fields(session = %session, device = %device.id, readings = readings.len())
    )]
    pub fn resample(
        &self,
        readings: Vec<SensorReading>,
        session: &SessionId,
        device: &DeviceConfig,
    ) -> Result<ResampledSeries, ResampleError> {
        let width = device.channels.len();
        for (index, reading) in readings.iter().enumerate() {
            if !reading.timestamp.is_finite() {
                return Err(ResampleError::NonFiniteTimestamp { index });
            }
            if reading.values.len() != width {
                return Err(ResampleError::ChannelMismatch {
                    index,
                    expected: width,
                    found: reading.values.len(),
                });
            }
        }

        let prepared = prepare(readings, self.options.duplicates);
        let (Some(&first), Some(&last)) = (prepared.times.first(), prepared.times.last()) else {
            return Err(ResampleError::Empty);
        };

        if prepared.out_of_order > 0 {
            warn!(count = prepared.out_of_order, "readings out of order, sorted");
        }
        if prepared.duplicates > 0 {
            debug!(
                count = prepared.duplicates,
                policy = ?self.options.duplicates,
                "duplicate timestamps collapsed"
            );
        }

        let too_large = ResampleError::SpanTooLarge {
            first,
            last,
            max_span_s: self.options.max_span_s,
        };
        if last - first > self.options.max_span_s {
            return Err(too_large);
        }
        let grid = Grid::covering(first, last, self.options.rate_hz, self.options.anchor)
            .ok_or(too_large)?;
        let mut cursor =
            interp::Cursor::new(&prepared.times, &prepared.values, self.options.boundary);
        let samples = grid.iter().map(|t| cursor.sample(t)).collect::<Vec<_>>();

        debug!(
            start = grid.start,
            rows = samples.len(),
            "series resampled"
        );

        Ok(ResampledSeries {
            session_id: session.clone(),
            device_id: device.id.clone(),
            start: grid.start,
            rate_hz: self.options.rate_hz,
            channels: device.channels.clone(),
            samples,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingestion::MockSensorSource;

    fn device(channels: usize) -> DeviceConfig {
        DeviceConfig {
            id: "imu".into(),
            channels: (0..channels).map(|c| format!("c{c}")).collect(),
            header_lines: 0,
            timestamp_column: None,
            source_columns: None,
        }
    }

    fn resampler() -> Resampler {
        Resampler::new(ResampleOptions::default())
    }

    #[test]
    fn test_jittered_148hz_yields_300_rows() {
        let readings = MockSensorSource::accelerometer(148.0, 10.0).generate();
        let series = resampler()
            .resample(readings, &"S01".into(), &device(3))
            .unwrap();

        assert_eq!(series.len(), 300);
        assert_eq!(series.start, 0.0);
        let period = 1.0 / 30.0;
        for k in 1..series.len() {
            let dt = series.timestamp(k) - series.timestamp(k - 1);
            assert!((dt - period).abs() < 1e-9);
        }
    }

    #[test]
    fn test_values_stay_within_bracketing_pair() {
        let readings = MockSensorSource::accelerometer(148.0, 2.0).generate();
        let series = resampler()
            .resample(readings.clone(), &"S01".into(), &device(3))
            .unwrap();

        for (t, values) in series.iter() {
            let j = readings
                .iter()
                .rposition(|r| r.timestamp <= t)
                .unwrap();
            let lo = &readings[j];
            let hi = readings.get(j + 1).unwrap_or(lo);
            for c in 0..3 {
                let (a, b) = (lo.values[c], hi.values[c]);
                assert!(values[c] >= a.min(b) && values[c] <= a.max(b));
            }
        }
    }

    #[test]
    fn test_exact_grid_hits_are_copied() {
        let readings = (0..10)
            .map(|k| SensorReading::new(k as f64 / 30.0, vec![k as f64]))
            .collect();
        let series = resampler()
            .resample(readings, &"S01".into(), &device(1))
            .unwrap();
        assert_eq!(series.len(), 10);
        assert_eq!(series.samples[4], vec![4.0]);
    }

    #[test]
    fn test_single_reading() {
        let series = resampler()
            .resample(
                vec![SensorReading::new(5.0, vec![1.0, 2.0])],
                &"S01".into(),
                &device(2),
            )
            .unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.samples[0], vec![1.0, 2.0]);
    }

    #[test]
    fn test_anchor_aligns_lattice() {
        let readings = vec![
            SensorReading::new(0.01, vec![0.0]),
            SensorReading::new(1.01, vec![100.0]),
        ];
        let options = ResampleOptions {
            rate_hz: 10.0,
            anchor: Some(0.0),
            ..Default::default()
        };
        let series = Resampler::new(options)
            .resample(readings, &"S01".into(), &device(1))
            .unwrap();
        assert!((series.start - 0.1).abs() < 1e-12);
        assert_eq!(series.len(), 10);
        assert!((series.samples[0][0] - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_errors() {
        let r = resampler();
        assert_eq!(
            r.resample(vec![], &"S01".into(), &device(1)).unwrap_err(),
            ResampleError::Empty
        );
        assert_eq!(
            r.resample(
                vec![SensorReading::new(0.0, vec![1.0, 2.0])],
                &"S01".into(),
                &device(1)
            )
            .unwrap_err(),
            ResampleError::ChannelMismatch {
                index: 0,
                expected: 1,
                found: 2
            }
        );

        let err = ResampleError::Empty.into_contract(&device(1), Path::new("raw.txt"));
        assert_eq!(err.kind(), "empty_input");
    }

    #[test]
    fn test_corrupt_timestamp_exceeds_span() {
        let readings = vec![
            SensorReading::new(0.0, vec![0.1]),
            SensorReading::new(1.0, vec![0.2]),
            SensorReading::new(1e18, vec![0.3]),
        ];
        let err = resampler()
            .resample(readings, &"S01".into(), &device(1))
            .unwrap_err();
        assert!(
            matches!(err, ResampleError::SpanTooLarge { first, last, .. } if first == 0.0 && last == 1e18),
            "got {err:?}"
        );

        let err = err.into_contract(&device(1), Path::new("raw.txt"));
        assert_eq!(err.kind(), "parse");
        assert!(err.to_string().contains("86400"), "got: {err}");
    }

    #[test]
    fn test_span_limit_is_configurable() {
        let readings = vec![
            SensorReading::new(0.0, vec![0.0]),
            SensorReading::new(20.0, vec![1.0]),
        ];
        let options = ResampleOptions {
            max_span_s: 10.0,
            ..Default::default()
        };
        let err = Resampler::new(options)
            .resample(readings.clone(), &"S01".into(), &device(1))
            .unwrap_err();
        assert!(matches!(err, ResampleError::SpanTooLarge { .. }));

        let series = resampler()
            .resample(readings, &"S01".into(), &device(1))
            .unwrap();
        assert_eq!(series.len(), 601);
    }

    #[test]
    fn test_deterministic() {
        let make = || MockSensorSource::accelerometer(100.0, 3.0).generate();
        let a = resampler().resample(make(), &"S01".into(), &device(3)).unwrap();
        let b = resampler().resample(make(), &"S01".into(), &device(3)).unwrap();
        assert_eq!(a, b);
    }
}
