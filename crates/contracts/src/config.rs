//! PipelineBlueprint - Config Loader output
//!
//! Describes the full preprocessing setup: sampling policy, file roots,
//! device channel definitions and the per-session manifest.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::{DeviceId, SessionId, TimestampFormat};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete pipeline configuration blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Sampling and alignment policy
    #[serde(default)]
    pub general: GeneralConfig,

    /// Input and output roots
    pub paths: PathsConfig,

    /// Device definitions, in feature order
    pub devices: Vec<DeviceConfig>,

    /// Session manifest
    #[serde(default)]
    pub sessions: Vec<SessionConfig>,
}

impl PipelineBlueprint {
    /// Look up a device definition
    pub fn device(&self, id: &str) -> Option<&DeviceConfig> {
        self.devices.iter().find(|d| d.id == id)
    }

    /// Look up a session entry
    pub fn session(&self, id: &str) -> Option<&SessionConfig> {
        self.sessions.iter().find(|s| s.id == id)
    }
}

/// Sampling and alignment policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Target sample rate (Hz)
    #[serde(default = "default_sample_rate")]
    pub sample_rate_hz: f64,

    /// Expected width of every feature row
    #[serde(default = "default_feature_dimension")]
    pub feature_dimension: usize,

    #[serde(default)]
    pub boundary_policy: BoundaryPolicy,

    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,

    /// Timestamp format of raw logs and frame files
    #[serde(default)]
    pub timestamp_format: TimestampFormat,

    #[serde(default)]
    pub channel_order: ChannelOrder,

    #[serde(default)]
    pub sync_method: SyncMethod,

    /// Longest raw recording (seconds) a device may span
    #[serde(default = "default_max_span")]
    pub max_span_s: f64,
}

fn default_sample_rate() -> f64 {
    30.0
}

fn default_feature_dimension() -> usize {
    63
}

fn default_max_span() -> f64 {
    // One day
    86_400.0
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: default_sample_rate(),
            feature_dimension: default_feature_dimension(),
            boundary_policy: BoundaryPolicy::default(),
            duplicate_policy: DuplicatePolicy::default(),
            timestamp_format: TimestampFormat::default(),
            channel_order: ChannelOrder::default(),
            sync_method: SyncMethod::default(),
            max_span_s: default_max_span(),
        }
    }
}

/// Rule for target timestamps outside the available samples
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Repeat the edge sample
    #[default]
    Clamp,
    /// Extend the edge pair linearly
    Extrapolate,
}

/// Rule for raw samples sharing one timestamp
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep the sample that appears last in the file
    #[default]
    KeepLast,
    /// Keep the sample that appears first in the file
    KeepFirst,
    /// Average all samples sharing the timestamp
    Average,
}

/// Feature column ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelOrder {
    /// Same physical quantity adjacent across devices
    /// (`dev1_accel_x, dev2_accel_x, ..., dev1_accel_y, ...`)
    #[default]
    ChannelMajor,
    /// All channels of one device, then the next device
    DeviceMajor,
}

/// How a frame picks its value from a resampled series
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMethod {
    /// Closest sample: `round((t - start) * rate)`
    #[default]
    Nearest,
    /// Linear interpolation between the bracketing samples
    Linear,
}

/// Input and output roots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root that session device paths are relative to
    pub raw_root: PathBuf,

    /// Root that session frame files are relative to
    pub frames_root: PathBuf,

    /// Resampler output directory
    pub resampled_dir: PathBuf,

    /// Synchronizer output directory
    pub features_dir: PathBuf,
}

impl PathsConfig {
    /// Absolute-or-relative path of a raw device log
    pub fn raw_path(&self, relative: &Path) -> PathBuf {
        self.raw_root.join(relative)
    }

    /// Path of a session's frame timestamp file
    pub fn frames_path(&self, relative: &Path) -> PathBuf {
        self.frames_root.join(relative)
    }

    /// Directory holding one session's resampled series
    pub fn resampled_session_dir(&self, session: &SessionId) -> PathBuf {
        self.resampled_dir.join(session.as_str())
    }

    /// `{resampled_dir}/{session}/{device}_resample_{rate:.1}Hz.csv`
    pub fn resampled_path(&self, session: &SessionId, device: &DeviceId, rate_hz: f64) -> PathBuf {
        self.resampled_session_dir(session)
            .join(format!("{device}_resample_{rate_hz:.1}Hz.csv"))
    }

    /// `{features_dir}/{session}_features_{rate:.1}Hz.csv`
    pub fn features_path(&self, session: &SessionId, rate_hz: f64) -> PathBuf {
        self.features_dir
            .join(format!("{session}_features_{rate_hz:.1}Hz.csv"))
    }
}

/// Device definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Unique identifier
    pub id: DeviceId,

    /// Channel names, in raw column order (after the timestamp)
    pub channels: Vec<String>,

    /// Leading lines of each raw log that are not data rows
    #[serde(default)]
    pub header_lines: usize,

    /// Header name of the timestamp column.
    ///
    /// When set, the last header line holds column names and columns are
    /// picked by name instead of position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_column: Option<String>,

    /// Header names of the channel columns, in `channels` order.
    /// Defaults to `channels` when `timestamp_column` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_columns: Option<Vec<String>>,
}

impl DeviceConfig {
    /// Header names to read, `None` for positional layout
    pub fn named_columns(&self) -> Option<(&str, &[String])> {
        let timestamp = self.timestamp_column.as_deref()?;
        let channels = self.source_columns.as_deref().unwrap_or(&self.channels);
        Some((timestamp, channels))
    }
}

/// One session of the manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique identifier
    pub id: SessionId,

    /// Frame timestamp file, relative to `paths.frames_root`
    pub frames: PathBuf,

    /// Resampling grid anchor (video head timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,

    /// Header lines of the frame file
    #[serde(default)]
    pub frames_header_lines: usize,

    /// Raw log per device, relative to `paths.raw_root`
    pub devices: BTreeMap<DeviceId, PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths() -> PathsConfig {
        PathsConfig {
            raw_root: "raw".into(),
            frames_root: "frames".into(),
            resampled_dir: "out/resampled".into(),
            features_dir: "out/features".into(),
        }
    }

    #[test]
    fn test_output_naming() {
        let p = paths();
        let session: SessionId = "S07_Brownie".into();
        let device: DeviceId = "imu_left".into();
        assert_eq!(
            p.resampled_path(&session, &device, 30.0),
            PathBuf::from("out/resampled/S07_Brownie/imu_left_resample_30.0Hz.csv")
        );
        assert_eq!(
            p.features_path(&session, 30.0),
            PathBuf::from("out/features/S07_Brownie_features_30.0Hz.csv")
        );
    }

    #[test]
    fn test_general_defaults() {
        let general = GeneralConfig::default();
        assert_eq!(general.sample_rate_hz, 30.0);
        assert_eq!(general.feature_dimension, 63);
        assert_eq!(general.boundary_policy, BoundaryPolicy::Clamp);
        assert_eq!(general.duplicate_policy, DuplicatePolicy::KeepLast);
        assert_eq!(general.sync_method, SyncMethod::Nearest);
        assert_eq!(general.max_span_s, 86_400.0);
    }

    #[test]
    fn test_named_columns() {
        let mut device = DeviceConfig {
            id: "3dmgx1_2794".into(),
            channels: vec!["accel_x".into(), "accel_y".into()],
            header_lines: 2,
            timestamp_column: None,
            source_columns: None,
        };
        assert!(device.named_columns().is_none());

        device.timestamp_column = Some("SysTime".into());
        let (timestamp, columns) = device.named_columns().unwrap();
        assert_eq!(timestamp, "SysTime");
        assert_eq!(columns, ["accel_x", "accel_y"]);

        device.source_columns = Some(vec!["Accel_X".into(), "Accel_Y".into()]);
        assert_eq!(device.named_columns().unwrap().1, ["Accel_X", "Accel_Y"]);
    }

    #[test]
    fn test_policy_serde_names() {
        let json = serde_json::to_string(&DuplicatePolicy::KeepFirst).unwrap();
        assert_eq!(json, "\"keep_first\"");
        let order: ChannelOrder = serde_json::from_str("\"device_major\"").unwrap();
        assert_eq!(order, ChannelOrder::DeviceMajor);
    }
}
