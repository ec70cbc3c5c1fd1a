//! Session manifest
//!
//! Resolves `session → {device → raw file}` once, up front, so that an
//! incomplete session is a configuration error instead of a mid-run surprise.

use std::path::PathBuf;

use contracts::{ContractError, DeviceId, PipelineBlueprint, SessionId};

/// Raw input of one device within a session
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInput {
    pub device_id: DeviceId,
    /// Index into `PipelineBlueprint::devices`
    pub device_index: usize,
    /// Resolved raw log path
    pub raw_path: PathBuf,
}

/// Fully resolved session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEntry {
    pub id: SessionId,
    /// Resolved frame timestamp file
    pub frames_path: PathBuf,
    pub frames_header_lines: usize,
    /// Resampling grid anchor (seconds), if configured
    pub anchor: Option<f64>,
    /// One input per configured device, in configured device order
    pub inputs: Vec<DeviceInput>,
}

impl SessionEntry {
    /// Check that every raw log exists on disk
    ///
    /// Runs before resampling so that a missing raw file fails the session
    /// as a configuration problem, not halfway through.
    pub fn verify_raw_inputs(&self) -> Result<(), ContractError> {
        for input in &self.inputs {
            if !input.raw_path.is_file() {
                return Err(ContractError::config(
                    format!("sessions[{}].devices.{}", self.id, input.device_id),
                    format!("raw log not found: {}", input.raw_path.display()),
                ));
            }
        }
        Ok(())
    }
}

/// Validated session manifest, sorted by session id
#[derive(Debug, Clone, Default)]
pub struct SessionManifest {
    entries: Vec<SessionEntry>,
}

impl SessionManifest {
    /// Build and check completeness against the configured devices
    pub fn from_blueprint(blueprint: &PipelineBlueprint) -> Result<Self, ContractError> {
        let format = blueprint.general.timestamp_format;
        let mut entries = Vec::with_capacity(blueprint.sessions.len());

        for session in &blueprint.sessions {
            for device in session.devices.keys() {
                if blueprint.device(device).is_none() {
                    return Err(ContractError::config(
                        format!("sessions[{}].devices.{}", session.id, device),
                        "device is not defined in [[devices]]",
                    ));
                }
            }

            let mut inputs = Vec::with_capacity(blueprint.devices.len());
            for (device_index, device) in blueprint.devices.iter().enumerate() {
                let relative = session.devices.get(device.id.as_str()).ok_or_else(|| {
                    ContractError::config(
                        format!("sessions[{}].devices", session.id),
                        format!("no raw log for expected device '{}'", device.id),
                    )
                })?;
                inputs.push(DeviceInput {
                    device_id: device.id.clone(),
                    device_index,
                    raw_path: blueprint.paths.raw_path(relative),
                });
            }

            let anchor = session
                .anchor
                .as_deref()
                .map(|text| format.parse_anchor(text))
                .transpose()
                .map_err(|msg| {
                    ContractError::config(format!("sessions[{}].anchor", session.id), msg)
                })?;

            entries.push(SessionEntry {
                id: session.id.clone(),
                frames_path: blueprint.paths.frames_path(&session.frames),
                frames_header_lines: session.frames_header_lines,
                anchor,
                inputs,
            });
        }

        entries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[SessionEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&SessionEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Restrict to the requested sessions (all when `ids` is empty)
    ///
    /// # Errors
    /// Unknown session id
    pub fn select(&self, ids: &[SessionId]) -> Result<Vec<SessionEntry>, ContractError> {
        if ids.is_empty() {
            return Ok(self.entries.clone());
        }
        let mut selected = Vec::with_capacity(ids.len());
        for id in ids {
            let entry = self.get(id).ok_or_else(|| {
                ContractError::config("sessions", format!("unknown session '{id}'"))
            })?;
            if !selected.iter().any(|e: &SessionEntry| e.id == entry.id) {
                selected.push(entry.clone());
            }
        }
        selected.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        ConfigVersion, DeviceConfig, GeneralConfig, PathsConfig, SessionConfig,
    };
    use std::collections::BTreeMap;

    fn blueprint() -> PipelineBlueprint {
        let devices = vec![
            DeviceConfig {
                id: "b_imu".into(),
                channels: vec!["x".into()],
                header_lines: 0,
                timestamp_column: None,
                source_columns: None,
            },
            DeviceConfig {
                id: "a_imu".into(),
                channels: vec!["x".into()],
                header_lines: 0,
                timestamp_column: None,
                source_columns: None,
            },
        ];
        let session = |id: &str| SessionConfig {
            id: id.into(),
            frames: format!("{id}.frames").into(),
            anchor: None,
            frames_header_lines: 0,
            devices: BTreeMap::from([
                ("a_imu".into(), format!("{id}/a.txt").into()),
                ("b_imu".into(), format!("{id}/b.txt").into()),
            ]),
        };
        PipelineBlueprint {
            version: ConfigVersion::V1,
            general: GeneralConfig {
                feature_dimension: 2,
                ..Default::default()
            },
            paths: PathsConfig {
                raw_root: "raw".into(),
                frames_root: "frames".into(),
                resampled_dir: "r".into(),
                features_dir: "f".into(),
            },
            devices,
            sessions: vec![session("S02"), session("S01")],
        }
    }

    #[test]
    fn test_entries_sorted_and_inputs_in_device_order() {
        let manifest = SessionManifest::from_blueprint(&blueprint()).unwrap();
        let ids: Vec<&str> = manifest.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["S01", "S02"]);

        let s01 = manifest.get("S01").unwrap();
        assert_eq!(s01.inputs[0].device_id, "b_imu");
        assert_eq!(s01.inputs[0].raw_path, PathBuf::from("raw/S01/b.txt"));
        assert_eq!(s01.frames_path, PathBuf::from("frames/S01.frames"));
    }

    #[test]
    fn test_missing_device_is_configuration_error() {
        let mut bp = blueprint();
        bp.sessions[0].devices.remove("a_imu");
        let err = SessionManifest::from_blueprint(&bp).unwrap_err();
        assert!(matches!(err, ContractError::Configuration { .. }));
        assert!(err.to_string().contains("a_imu"), "got: {err}");
    }

    #[test]
    fn test_unknown_device_is_configuration_error() {
        let mut bp = blueprint();
        bp.sessions[0]
            .devices
            .insert("ghost".into(), "S02/ghost.txt".into());
        let err = SessionManifest::from_blueprint(&bp).unwrap_err();
        assert!(err.to_string().contains("ghost"), "got: {err}");
    }

    #[test]
    fn test_bad_anchor_is_configuration_error() {
        let mut bp = blueprint();
        bp.sessions[0].anchor = Some("noon-ish".into());
        let err = SessionManifest::from_blueprint(&bp).unwrap_err();
        assert!(err.to_string().contains("anchor"), "got: {err}");
    }

    #[test]
    fn test_select() {
        let manifest = SessionManifest::from_blueprint(&blueprint()).unwrap();
        assert_eq!(manifest.select(&[]).unwrap().len(), 2);
        let one = manifest.select(&["S02".into(), "S02".into()]).unwrap();
        assert_eq!(one.len(), 1);
        assert!(manifest.select(&["S99".into()]).is_err());
    }

    #[test]
    fn test_verify_raw_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let mut bp = blueprint();
        bp.paths.raw_root = dir.path().to_path_buf();
        let manifest = SessionManifest::from_blueprint(&bp).unwrap();
        let entry = manifest.get("S01").unwrap();
        assert!(entry.verify_raw_inputs().is_err());

        std::fs::create_dir_all(dir.path().join("S01")).unwrap();
        std::fs::write(dir.path().join("S01/a.txt"), "0 1\n").unwrap();
        std::fs::write(dir.path().join("S01/b.txt"), "0 1\n").unwrap();
        assert!(entry.verify_raw_inputs().is_ok());
    }
}
