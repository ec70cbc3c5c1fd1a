//! # Ingestion
//!
//! Flat-file readers for every pipeline input.
//!
//! Responsibilities:
//! - Parse raw device logs into `SensorReading`s
//! - Parse video frame timestamp files into `FrameTimestamp`s
//! - Load resampled series written by the resampler
//! - Fail the whole file on the first malformed row, citing its line
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::read_raw_log;
//!
//! let readings = read_raw_log(&path, &device, TimestampFormat::Seconds)?;
//! ```
//!
//! ## Mock Testing
//!
//! ```ignore
//! use ingestion::MockSensorSource;
//!
//! let source = MockSensorSource::accelerometer(148.0, 10.0);
//! source.write_to(&path, None)?;
//! ```

mod frames;
mod lines;
mod mock;
mod raw;
mod series;

// Re-exports
pub use contracts::{FrameTimestamp, ResampledSeries, SensorReading};
pub use frames::{parse_frame_timestamps, read_frame_timestamps};
pub use mock::{MockSensorConfig, MockSensorSource};
pub use raw::{parse_raw_log, read_raw_log};
pub use series::{parse_resampled_series, read_resampled_series};
