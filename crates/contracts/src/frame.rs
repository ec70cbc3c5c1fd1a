//! FrameTimestamp / SyncedFeatureRow - Synchronizer input and output

use serde::{Deserialize, Serialize};

use crate::SessionId;

/// One video frame on the sensor clock
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameTimestamp {
    /// Frame index within the video
    pub frame_index: u64,

    /// Capture time (seconds)
    pub timestamp: f64,
}

/// One synchronized output row
///
/// `features` follows the session's [`crate::FeatureLayout`] exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncedFeatureRow {
    pub frame_index: u64,

    /// Frame time the features were sampled at
    pub timestamp: f64,

    pub features: Vec<f64>,
}

/// Per-session feature table (Synchronizer output)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    pub session_id: SessionId,

    /// Rate of the series the rows were sampled from (Hz)
    pub rate_hz: f64,

    /// Column labels in layout order (`{device}_{channel}`)
    pub labels: Vec<String>,

    /// Exactly one row per input frame
    pub rows: Vec<SyncedFeatureRow>,
}

impl FeatureTable {
    /// Feature vector width
    pub fn dimension(&self) -> usize {
        self.labels.len()
    }
}
