//! # Contracts
//!
//! Frozen interface contracts shared by every pipeline crate: identifiers,
//! data model, configuration blueprint, error taxonomy and the sink trait.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - All timestamps are seconds (f64) on the sensor recording clock
//! - Resampled series are positional: sample `k` lives at `start + k / rate_hz`
//! - Frame timestamps share the sensor clock (see [`TimestampFormat`])

mod config;
mod error;
mod frame;
mod ids;
mod layout;
mod sensor;
mod series;
mod sink;

pub use config::*;
pub use error::*;
pub use frame::*;
pub use ids::{DeviceId, SessionId};
pub use layout::{FeatureLayout, FeatureSlot};
pub use sensor::*;
pub use series::ResampledSeries;
pub use sink::DataSink;
