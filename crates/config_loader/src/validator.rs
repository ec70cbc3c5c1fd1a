//! 配置校验模块
//!
//! 校验规则：
//! - sample_rate_hz > 0 且有限，max_span_s > 0 且有限
//! - device_id / session_id 唯一、非空，且可安全用作路径组件
//! - 每个设备至少一个通道，通道名在设备内唯一
//! - 按列名读取时：source_columns 与 channels 等长，header_lines >= 1
//! - 特征布局宽度 == feature_dimension
//! - session_id 唯一且非空
//! - 每个 session 覆盖全部设备 (见 manifest)

use std::collections::HashSet;

use contracts::{ContractError, DeviceConfig, FeatureLayout, PipelineBlueprint};

use crate::manifest::SessionManifest;

/// 校验 PipelineBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &PipelineBlueprint) -> Result<(), ContractError> {
    validate_general(blueprint)?;
    validate_devices(blueprint)?;
    validate_feature_dimension(blueprint)?;
    validate_session_ids(blueprint)?;
    SessionManifest::from_blueprint(blueprint)?;
    Ok(())
}

/// 校验采样率与特征维度
fn validate_general(blueprint: &PipelineBlueprint) -> Result<(), ContractError> {
    let general = &blueprint.general;
    if !(general.sample_rate_hz.is_finite() && general.sample_rate_hz > 0.0) {
        return Err(ContractError::config(
            "general.sample_rate_hz",
            format!(
                "sample_rate_hz must be > 0, got {}",
                general.sample_rate_hz
            ),
        ));
    }
    if !(general.max_span_s.is_finite() && general.max_span_s > 0.0) {
        return Err(ContractError::config(
            "general.max_span_s",
            format!("max_span_s must be > 0, got {}", general.max_span_s),
        ));
    }
    if general.feature_dimension == 0 {
        return Err(ContractError::config(
            "general.feature_dimension",
            "feature_dimension must be > 0",
        ));
    }
    Ok(())
}

/// 校验设备定义
fn validate_devices(blueprint: &PipelineBlueprint) -> Result<(), ContractError> {
    if blueprint.devices.is_empty() {
        return Err(ContractError::config(
            "devices",
            "at least one device must be configured",
        ));
    }

    let mut seen = HashSet::new();
    for (idx, device) in blueprint.devices.iter().enumerate() {
        if device.id.is_empty() {
            return Err(ContractError::config(
                format!("devices[{idx}].id"),
                "device id cannot be empty",
            ));
        }
        validate_path_component(format!("devices[{idx}].id"), device.id.as_str())?;
        if !seen.insert(device.id.as_str()) {
            return Err(ContractError::config(
                format!("devices[id={}]", device.id),
                "duplicate device_id",
            ));
        }
        if device.channels.is_empty() {
            return Err(ContractError::config(
                format!("devices[{}].channels", device.id),
                "device must have at least one channel",
            ));
        }
        let mut channels = HashSet::new();
        for channel in &device.channels {
            if channel.is_empty() || !channels.insert(channel.as_str()) {
                return Err(ContractError::config(
                    format!("devices[{}].channels", device.id),
                    format!("empty or duplicate channel name '{channel}'"),
                ));
            }
        }
        validate_column_selection(device)?;
    }
    Ok(())
}

/// 校验按列名读取的设置
fn validate_column_selection(device: &DeviceConfig) -> Result<(), ContractError> {
    let field = |name: &str| format!("devices[{}].{name}", device.id);
    match (&device.timestamp_column, &device.source_columns) {
        (None, None) => Ok(()),
        (None, Some(_)) => Err(ContractError::config(
            field("source_columns"),
            "source_columns requires timestamp_column",
        )),
        (Some(timestamp), columns) => {
            if timestamp.is_empty() {
                return Err(ContractError::config(
                    field("timestamp_column"),
                    "timestamp_column cannot be empty",
                ));
            }
            if let Some(columns) = columns {
                if columns.len() != device.channels.len() {
                    return Err(ContractError::config(
                        field("source_columns"),
                        format!(
                            "{} source columns for {} channels",
                            columns.len(),
                            device.channels.len()
                        ),
                    ));
                }
            }
            if device.header_lines == 0 {
                return Err(ContractError::config(
                    field("header_lines"),
                    "reading columns by name needs a header line",
                ));
            }
            Ok(())
        }
    }
}

/// id 会成为输出路径的一部分，不能包含分隔符或 `..`
fn validate_path_component(field: String, id: &str) -> Result<(), ContractError> {
    let unsafe_id = id == "."
        || id == ".."
        || id.contains(['/', '\\'])
        || id.contains("..")
        || id.trim() != id;
    if unsafe_id {
        return Err(ContractError::config(
            field,
            format!("'{id}' cannot be used as a path component"),
        ));
    }
    Ok(())
}

/// 校验布局宽度
fn validate_feature_dimension(blueprint: &PipelineBlueprint) -> Result<(), ContractError> {
    let layout = FeatureLayout::new(&blueprint.devices, blueprint.general.channel_order);
    let expected = blueprint.general.feature_dimension;
    if layout.dimension() != expected {
        return Err(ContractError::config(
            "general.feature_dimension",
            format!(
                "configured devices provide {} channels, feature_dimension is {}",
                layout.dimension(),
                expected
            ),
        ));
    }
    Ok(())
}

/// 校验 session_id 唯一性
fn validate_session_ids(blueprint: &PipelineBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, session) in blueprint.sessions.iter().enumerate() {
        if session.id.is_empty() {
            return Err(ContractError::config(
                format!("sessions[{idx}].id"),
                "session id cannot be empty",
            ));
        }
        validate_path_component(format!("sessions[{idx}].id"), session.id.as_str())?;
        if !seen.insert(session.id.as_str()) {
            return Err(ContractError::config(
                format!("sessions[id={}]", session.id),
                "duplicate session_id",
            ));
        }
    }
    Ok(())
}
